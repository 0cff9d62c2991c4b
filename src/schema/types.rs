use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Every name a binding can be stored under. Declaration order is the
/// canonical output order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BindingName {
    Move,
    Aim,
    Jump,
    Primary,
    Secondary,
    Tertiary,
    Modifier,
    Pause,
    Magnitude,
}

impl BindingName {
    pub fn is_axis(self) -> bool {
        matches!(self, BindingName::Move | BindingName::Aim)
    }

    pub fn action_slots() -> impl Iterator<Item = BindingName> {
        BindingName::iter().filter(|n| !n.is_axis())
    }

    /// Lower is easier to reach from the right thumb anchor.
    pub fn reach_rank(self) -> u8 {
        match self {
            BindingName::Primary => 0,
            BindingName::Jump => 1,
            BindingName::Magnitude => 2,
            BindingName::Secondary => 3,
            BindingName::Tertiary => 4,
            BindingName::Modifier => 5,
            BindingName::Pause => 6,
            BindingName::Move | BindingName::Aim => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ControlKind {
    Axis,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ControlSpace {
    Vector,
    Rate,
    Magnitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Behavior {
    Continuous,
    Discrete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Interaction {
    Tap,
    Hold,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Activation {
    Hold,
    Latch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DirectionMode {
    Vector,
    Cardinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
    Fine,
    Coarse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PairPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum AxisUsage {
    Movement,
    Aim,
}

impl AxisUsage {
    pub fn binding_name(self) -> BindingName {
        match self {
            AxisUsage::Movement => BindingName::Move,
            AxisUsage::Aim => BindingName::Aim,
        }
    }
}

/// Named default layout templates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Archetype {
    SafePlatformer,
    FastPlatformer,
    DualStick,
    Runner,
    DigitalDpad,
}

/// The `layout` field: automatic selection or an explicit archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LayoutPreference {
    #[default]
    Auto,
    Custom,
    Explicit(Archetype),
}

impl LayoutPreference {
    pub fn explicit(self) -> Option<Archetype> {
        match self {
            LayoutPreference::Explicit(a) => Some(a),
            LayoutPreference::Auto | LayoutPreference::Custom => None,
        }
    }
}

impl fmt::Display for LayoutPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutPreference::Auto => f.write_str("auto"),
            LayoutPreference::Custom => f.write_str("custom"),
            LayoutPreference::Explicit(a) => write!(f, "{}", a),
        }
    }
}

impl FromStr for LayoutPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" | "" => Ok(LayoutPreference::Auto),
            "custom" => Ok(LayoutPreference::Custom),
            other => Archetype::from_str(other)
                .map(LayoutPreference::Explicit)
                .map_err(|_| other.to_string()),
        }
    }
}

impl From<LayoutPreference> for String {
    fn from(pref: LayoutPreference) -> String {
        pref.to_string()
    }
}

impl TryFrom<String> for LayoutPreference {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse()
            .map_err(|v| format!("unknown layout '{}'", v))
    }
}

/// Up to four directions mapped to key names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<String>,
}

impl AxisBinding {
    pub fn get(&self, dir: Direction) -> Option<&str> {
        match dir {
            Direction::Left => self.left.as_deref(),
            Direction::Right => self.right.as_deref(),
            Direction::Up => self.up.as_deref(),
            Direction::Down => self.down.as_deref(),
        }
    }

    pub fn set(&mut self, dir: Direction, key: String) {
        let slot = match dir {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
        };
        *slot = Some(key);
    }

    /// Bound directions in `left, right, up, down` order.
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &str)> + '_ {
        Direction::iter().filter_map(move |d| self.get(d).map(|k| (d, k)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn has_horizontal(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    pub fn has_vertical(&self) -> bool {
        self.up.is_some() || self.down.is_some()
    }

    pub fn is_horizontal_only(&self) -> bool {
        self.has_horizontal() && !self.has_vertical()
    }

    pub fn horizontal_only(&self) -> AxisBinding {
        AxisBinding {
            left: self.left.clone(),
            right: self.right.clone(),
            up: None,
            down: None,
        }
    }

    /// First bound key in the given preference order.
    pub fn first_of(&self, order: &[Direction]) -> Option<&str> {
        order.iter().find_map(|&d| self.get(d))
    }
}

/// A stored binding: a direction map for axes, a key name for actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    Key(String),
    Axis(AxisBinding),
}

impl Binding {
    pub fn as_axis(&self) -> Option<&AxisBinding> {
        match self {
            Binding::Axis(a) => Some(a),
            Binding::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Binding::Key(k) => Some(k),
            Binding::Axis(_) => None,
        }
    }

    /// Every key name referenced by this binding.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Binding::Key(k) => vec![k.as_str()],
            Binding::Axis(a) => a.iter().map(|(_, k)| k).collect(),
        }
    }
}

/// Behavioral descriptor for one binding, with every default applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMeta {
    pub kind: ControlKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_space: Option<ControlSpace>,
    pub behavior: Behavior,
    pub interaction: Interaction,
    pub activation: Activation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_mode: Option<DirectionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<Granularity>,
    pub simultaneous: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_position: Option<PairPosition>,
}

impl ActionMeta {
    /// Defaults for an absent entry. A magnitude control space turns an
    /// action into a held, continuous control.
    pub fn defaults_for(name: BindingName, control_space: Option<ControlSpace>) -> Self {
        if name.is_axis() {
            return Self {
                kind: ControlKind::Axis,
                control_space: Some(control_space.unwrap_or(ControlSpace::Vector)),
                behavior: Behavior::Continuous,
                interaction: Interaction::Hold,
                activation: Activation::Hold,
                direction_mode: Some(DirectionMode::Vector),
                granularity: Some(Granularity::Fine),
                simultaneous: false,
                pair_id: None,
                pair_position: None,
            };
        }

        let (behavior, interaction) = match control_space {
            Some(ControlSpace::Magnitude) => (Behavior::Continuous, Interaction::Hold),
            _ => (Behavior::Discrete, Interaction::Tap),
        };

        Self {
            kind: ControlKind::Button,
            control_space,
            behavior,
            interaction,
            activation: Activation::Hold,
            direction_mode: None,
            granularity: None,
            simultaneous: false,
            pair_id: None,
            pair_position: None,
        }
    }

    pub fn pair(&self) -> Option<(&str, PairPosition)> {
        match (&self.pair_id, self.pair_position) {
            (Some(id), Some(pos)) => Some((id.as_str(), pos)),
            _ => None,
        }
    }
}

/// The single model every downstream component consumes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalConfig {
    #[serde(default)]
    pub layout: LayoutPreference,
    pub bindings: BTreeMap<BindingName, Binding>,
    #[serde(rename = "actionMeta", alias = "action_meta")]
    pub action_meta: BTreeMap<BindingName, ActionMeta>,
}

impl CanonicalConfig {
    pub fn axis(&self, name: BindingName) -> Option<&AxisBinding> {
        self.bindings.get(&name).and_then(Binding::as_axis)
    }

    pub fn key(&self, name: BindingName) -> Option<&str> {
        self.bindings.get(&name).and_then(Binding::as_key)
    }

    pub fn meta(&self, name: BindingName) -> Option<&ActionMeta> {
        self.action_meta.get(&name)
    }

    pub fn control_space(&self, name: BindingName) -> Option<ControlSpace> {
        self.meta(name).and_then(|m| m.control_space)
    }

    /// Bound action slots (not axes) in canonical order.
    pub fn actions(&self) -> impl Iterator<Item = (BindingName, &str)> + '_ {
        self.bindings
            .iter()
            .filter_map(|(name, b)| b.as_key().map(|k| (*name, k)))
    }
}
