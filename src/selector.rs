//! Archetype selection and control planning.
//!
//! `select` picks an archetype from the canonical model through an ordered
//! rule table; `plan` turns the model into the list of controls the geometry
//! engine has to place.

use crate::schema::{
    ActionMeta, Activation, Archetype, AxisBinding, Binding, BindingName, CanonicalConfig, ControlSpace,
    DirectionMode, Granularity, PairPosition,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ControlType {
    Button,
    Joystick,
    Dpad,
}

/// Which row of the sizing table a control draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    Movement,
    Standard,
    Small,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairTag {
    pub id: String,
    pub position: PairPosition,
}

/// One control to be placed, before it has coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    pub id: String,
    pub role: BindingName,
    pub control_type: ControlType,
    pub keys: Binding,
    pub size_class: SizeClass,
    pub pair: Option<PairTag>,
    pub latch: bool,
}

/// Controls that move together in the right cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlUnit {
    Single(ControlSpec),
    /// Members ordered `left` then `right`.
    Pair(ControlSpec, ControlSpec),
}

impl ControlUnit {
    pub fn members(&self) -> Vec<&ControlSpec> {
        match self {
            ControlUnit::Single(c) => vec![c],
            ControlUnit::Pair(l, r) => vec![l, r],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlPlan {
    pub archetype: Archetype,
    pub decoupled: bool,
    /// Bottom-left cluster.
    pub movement: Option<ControlSpec>,
    /// Bottom-right cluster, nearest the anchor first.
    pub right: Vec<ControlUnit>,
}

impl ControlPlan {
    /// Every control in output order: move, aim, then actions by reach.
    pub fn controls(&self) -> impl Iterator<Item = &ControlSpec> {
        self.movement
            .iter()
            .chain(self.right.iter().flat_map(|u| u.members()))
    }
}

/// Facts the rule table inspects. Built once per selection.
#[derive(Debug, Clone)]
pub struct SelectionContext {
    pub has_aim: bool,
    pub decoupled: bool,
    /// `move` after decoupling, if bound.
    pub movement: Option<AxisBinding>,
}

impl SelectionContext {
    pub fn from_config(config: &CanonicalConfig) -> Self {
        let decoupled = is_decoupled(config);
        let movement = config
            .axis(BindingName::Move)
            .map(|axis| {
                if decoupled {
                    axis.horizontal_only()
                } else {
                    axis.clone()
                }
            })
            .filter(|axis| !axis.is_empty());
        Self {
            has_aim: config.bindings.contains_key(&BindingName::Aim),
            decoupled,
            movement,
        }
    }
}

type Rule = (&'static str, fn(&SelectionContext) -> bool, Archetype);

fn aim_present(ctx: &SelectionContext) -> bool {
    ctx.has_aim
}

fn horizontal_only(ctx: &SelectionContext) -> bool {
    ctx.movement.as_ref().is_some_and(AxisBinding::is_horizontal_only)
}

fn any_vertical(ctx: &SelectionContext) -> bool {
    ctx.movement.as_ref().is_some_and(AxisBinding::has_vertical)
}

/// Evaluated top to bottom; the first match wins.
const RULES: [Rule; 3] = [
    ("aim present", aim_present, Archetype::DualStick),
    ("horizontal-only movement", horizontal_only, Archetype::SafePlatformer),
    ("vertical movement", any_vertical, Archetype::FastPlatformer),
];

const FALLBACK: Archetype = Archetype::Runner;

/// A rate-space move plus any magnitude-space binding means the vertical
/// directions drive the magnitude control instead of movement.
pub fn is_decoupled(config: &CanonicalConfig) -> bool {
    if config.control_space(BindingName::Move) != Some(ControlSpace::Rate) {
        return false;
    }
    config
        .action_meta
        .iter()
        .any(|(name, meta)| *name != BindingName::Move && meta.control_space == Some(ControlSpace::Magnitude))
}

pub fn select(config: &CanonicalConfig) -> Archetype {
    if let Some(archetype) = config.layout.explicit() {
        return archetype;
    }
    let ctx = SelectionContext::from_config(config);
    for (label, rule, archetype) in RULES.iter() {
        if rule(&ctx) {
            debug!("Selected {} ({})", archetype, label);
            return *archetype;
        }
    }
    debug!("Selected {} (fallback)", FALLBACK);
    FALLBACK
}

fn movement_type(archetype: Archetype, meta: Option<&ActionMeta>, decoupled: bool) -> ControlType {
    match archetype {
        Archetype::DualStick if decoupled => ControlType::Dpad,
        Archetype::DualStick => ControlType::Joystick,
        Archetype::FastPlatformer => {
            let mode = meta.and_then(|m| m.direction_mode);
            let granularity = meta.and_then(|m| m.granularity);
            match (mode, granularity) {
                (Some(DirectionMode::Cardinal), Some(Granularity::Coarse)) => ControlType::Dpad,
                (Some(DirectionMode::Vector), Some(Granularity::Fine)) => ControlType::Joystick,
                (Some(DirectionMode::Cardinal), _) => ControlType::Dpad,
                _ => ControlType::Joystick,
            }
        }
        Archetype::SafePlatformer | Archetype::Runner | Archetype::DigitalDpad => ControlType::Dpad,
    }
}

pub fn plan(config: &CanonicalConfig, archetype: Archetype) -> ControlPlan {
    let ctx = SelectionContext::from_config(config);

    let movement = ctx.movement.clone().and_then(|axis| {
        let axis = if archetype == Archetype::SafePlatformer {
            axis.horizontal_only()
        } else {
            axis
        };
        // Nothing left to steer with once the vertical keys are gone.
        if axis.is_empty() {
            return None;
        }
        let control_type = movement_type(archetype, config.meta(BindingName::Move), ctx.decoupled);
        Some(ControlSpec {
            id: format!("{}-{}", BindingName::Move, control_type),
            role: BindingName::Move,
            control_type,
            keys: Binding::Axis(axis),
            size_class: SizeClass::Movement,
            pair: None,
            latch: false,
        })
    });

    let mut right = Vec::new();

    if let Some(axis) = config.axis(BindingName::Aim) {
        right.push(ControlUnit::Single(ControlSpec {
            id: format!("{}-{}", BindingName::Aim, ControlType::Joystick),
            role: BindingName::Aim,
            control_type: ControlType::Joystick,
            keys: Binding::Axis(axis.clone()),
            size_class: SizeClass::Movement,
            pair: None,
            latch: false,
        }));
    }

    let actions: Vec<(BindingName, &str)> = config
        .actions()
        .sorted_by_key(|(name, _)| name.reach_rank())
        .collect();
    let lead = actions.first().map(|(name, _)| *name);

    let spec_for = |name: BindingName, key: &str, size_class: SizeClass| {
        let meta = config.meta(name);
        ControlSpec {
            id: format!("{}-{}", name, ControlType::Button),
            role: name,
            control_type: ControlType::Button,
            keys: Binding::Key(key.to_string()),
            size_class,
            pair: meta.and_then(|m| m.pair()).map(|(id, position)| PairTag {
                id: id.to_string(),
                position,
            }),
            latch: meta.is_some_and(|m| m.activation == Activation::Latch),
        }
    };

    let mut placed_pairs: Vec<&str> = Vec::new();
    for (name, key) in &actions {
        let pair = config.meta(*name).and_then(|m| m.pair());
        match pair {
            None => {
                let size = if Some(*name) == lead {
                    SizeClass::Standard
                } else {
                    SizeClass::Small
                };
                right.push(ControlUnit::Single(spec_for(*name, key, size)));
            }
            Some((id, _)) if placed_pairs.contains(&id) => {}
            Some((id, _)) => {
                placed_pairs.push(id);
                let mut members: Vec<(BindingName, &str, PairPosition)> = actions
                    .iter()
                    .filter_map(|(n, k)| {
                        config
                            .meta(*n)
                            .and_then(|m| m.pair())
                            .filter(|(other, _)| *other == id)
                            .map(|(_, pos)| (*n, *k, pos))
                    })
                    .collect();
                members.sort_by_key(|(_, _, pos)| *pos);

                let size = if members.iter().any(|(n, _, _)| Some(*n) == lead) {
                    SizeClass::Standard
                } else {
                    SizeClass::Small
                };
                if let [(ln, lk, _), (rn, rk, _)] = members.as_slice() {
                    right.push(ControlUnit::Pair(
                        spec_for(*ln, lk, size),
                        spec_for(*rn, rk, size),
                    ));
                }
            }
        }
    }

    ControlPlan {
        archetype,
        decoupled: ctx.decoupled,
        movement,
        right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{normalize, SchemaInput};
    use serde_json::json;

    fn config(value: serde_json::Value) -> CanonicalConfig {
        normalize(&serde_json::from_value::<SchemaInput>(value).unwrap()).unwrap()
    }

    #[test]
    fn test_no_movement_falls_back_to_runner() {
        let c = config(json!({ "bindings": { "jump": "Space" } }));
        assert_eq!(select(&c), Archetype::Runner);
    }

    #[test]
    fn test_pair_is_one_unit_left_first() {
        let c = config(json!({
            "bindings": { "primary": "KeyX", "secondary": "KeyZ" },
            "actionMeta": {
                "primary": { "pair_id": "turn", "pair_position": "right" },
                "secondary": { "pair_id": "turn", "pair_position": "left" }
            }
        }));
        let p = plan(&c, Archetype::Runner);
        assert_eq!(p.right.len(), 1);
        match &p.right[0] {
            ControlUnit::Pair(l, r) => {
                assert_eq!(l.role, BindingName::Secondary);
                assert_eq!(r.role, BindingName::Primary);
                assert_eq!(l.size_class, SizeClass::Standard);
            }
            other => panic!("expected pair, got {:?}", other),
        }
    }
}
