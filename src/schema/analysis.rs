//! Parser for the analysis shape: an ordered `axes` list plus an `actions` map.

use super::raw::{check_key, parse_action_slot, parse_action_value, parse_opt, resolve_meta};
use super::raw::{ParsedShape, RawAxis, RawMeta};
use super::types::{
    ActionMeta, AxisBinding, AxisUsage, Binding, BindingName, ControlSpace, Direction, Priority,
};
use crate::error::SchemaError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Direction preference when a magnitude axis collapses to a single key.
const MAGNITUDE_KEY_ORDER: [Direction; 4] =
    [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

struct AxisCandidate {
    index: usize,
    priority: Option<Priority>,
    keys: AxisBinding,
    meta: ActionMeta,
}

pub(crate) fn parse(
    axes: Option<&[RawAxis]>,
    actions: Option<&BTreeMap<String, Value>>,
) -> Result<ParsedShape, SchemaError> {
    let mut out = ParsedShape::default();

    // Actions first: an explicit magnitude action outranks a magnitude axis.
    if let Some(actions) = actions {
        for (name, value) in actions {
            let slot = parse_action_slot(name)?;
            let (key, tags) = parse_action_value(slot, value)?;
            let meta = resolve_meta(slot, &tags.unwrap_or_default())?;
            out.bindings.insert(slot, Binding::Key(key));
            out.meta.insert(slot, meta);
        }
    }

    let mut candidates: BTreeMap<AxisUsage, Vec<AxisCandidate>> = BTreeMap::new();

    for (index, axis) in axes.unwrap_or_default().iter().enumerate() {
        let label = format!("axes[{}]", index);
        let usage_str = axis
            .usage
            .as_deref()
            .ok_or_else(|| SchemaError::Malformed(format!("{} has no usage", label)))?;
        let usage = AxisUsage::from_str(usage_str).map_err(|_| SchemaError::UnknownEnum {
            field: format!("{}.usage", label),
            value: usage_str.to_string(),
        })?;
        let priority = parse_opt::<Priority>(axis.priority.as_deref(), &format!("{}.priority", label))?;
        let keys = parse_axis_keys(&label, axis.keys.as_ref())?;

        let control_space = parse_opt::<ControlSpace>(
            axis.meta.control_space.as_deref(),
            &format!("{}.control_space", label),
        )?;

        if control_space == Some(ControlSpace::Magnitude) {
            let slot = BindingName::Magnitude;
            if out.bindings.contains_key(&slot) {
                debug!("{}: magnitude slot already bound, axis ignored", label);
                continue;
            }
            let key = keys
                .first_of(&MAGNITUDE_KEY_ORDER)
                .ok_or_else(|| SchemaError::MissingKey(label.clone()))?
                .to_string();
            // The axis collapses to a button, so its declared kind no longer applies.
            let tags = RawMeta {
                kind: None,
                ..axis.meta.clone()
            };
            out.bindings.insert(slot, Binding::Key(key));
            out.meta.insert(slot, resolve_meta(slot, &tags)?);
            continue;
        }

        let meta = resolve_meta(usage.binding_name(), &axis.meta)?;
        candidates.entry(usage).or_default().push(AxisCandidate {
            index,
            priority,
            keys,
            meta,
        });
    }

    for (usage, mut group) in candidates {
        let winner = pick_axis(usage, &mut group)?;
        let name = usage.binding_name();
        out.bindings.insert(name, Binding::Axis(winner.keys));
        out.meta.insert(name, winner.meta);
    }

    Ok(out)
}

/// Slot capacity is one per usage: the unique primary wins, the rest drop.
fn pick_axis(usage: AxisUsage, group: &mut Vec<AxisCandidate>) -> Result<AxisCandidate, SchemaError> {
    if group.len() == 1 {
        return Ok(group.remove(0));
    }

    let primaries: Vec<usize> = group
        .iter()
        .enumerate()
        .filter(|(_, c)| c.priority == Some(Priority::Primary))
        .map(|(i, _)| i)
        .collect();

    if primaries.len() != 1 {
        return Err(SchemaError::AmbiguousAxisPriority {
            usage: usage.to_string(),
            primaries: primaries.len(),
        });
    }

    let winner = group.remove(primaries[0]);
    for dropped in group.iter() {
        debug!(
            "Dropping {} axis #{} in favour of primary axis #{}",
            usage, dropped.index, winner.index
        );
    }
    Ok(winner)
}

pub(crate) fn parse_axis_keys(
    label: &str,
    keys: Option<&BTreeMap<String, String>>,
) -> Result<AxisBinding, SchemaError> {
    let keys = keys.ok_or_else(|| SchemaError::MissingKey(label.to_string()))?;
    let mut binding = AxisBinding::default();

    for (dir_name, key) in keys {
        let dir = Direction::from_str(dir_name).map_err(|_| SchemaError::UnknownDirection {
            binding: label.to_string(),
            direction: dir_name.clone(),
        })?;
        binding.set(dir, check_key(label, key)?);
    }

    if binding.is_empty() {
        return Err(SchemaError::MissingKey(label.to_string()));
    }
    Ok(binding)
}
