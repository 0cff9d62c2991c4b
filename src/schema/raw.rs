use super::types::{ActionMeta, BindingName, Binding, CanonicalConfig, ControlKind};
use crate::error::SchemaError;
use crate::keycodes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Behavioral tags as they arrive on the wire. Enum-valued fields stay
/// strings until validation so unknown values surface as `SchemaError`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_space: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granularity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simultaneous: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_position: Option<String>,
}

/// One entry of the analysis shape's `axes` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAxis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub meta: RawMeta,
}

/// Either input shape, or both. Downstream code only sees the result of
/// `schema::normalize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<RawAxis>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bindings: Option<BTreeMap<String, Value>>,
    #[serde(
        default,
        rename = "actionMeta",
        alias = "action_meta",
        skip_serializing_if = "Option::is_none"
    )]
    pub action_meta: Option<BTreeMap<String, RawMeta>>,
}

impl SchemaInput {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn has_analysis_shape(&self) -> bool {
        self.axes.is_some() || self.actions.is_some()
    }

    pub fn has_flat_shape(&self) -> bool {
        self.bindings.is_some() || self.action_meta.is_some()
    }
}

impl From<&CanonicalConfig> for SchemaInput {
    /// Re-expresses a canonical config in the flat shape.
    fn from(config: &CanonicalConfig) -> Self {
        let bindings = config
            .bindings
            .iter()
            .map(|(name, b)| {
                let value = serde_json::to_value(b).unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect();

        let action_meta = config
            .action_meta
            .iter()
            .map(|(name, m)| (name.to_string(), RawMeta::from(m)))
            .collect();

        Self {
            layout: Some(config.layout.to_string()),
            axes: None,
            actions: None,
            bindings: Some(bindings),
            action_meta: Some(action_meta),
        }
    }
}

impl From<&ActionMeta> for RawMeta {
    fn from(m: &ActionMeta) -> Self {
        Self {
            kind: Some(m.kind.to_string()),
            control_space: m.control_space.map(|v| v.to_string()),
            behavior: Some(m.behavior.to_string()),
            interaction: Some(m.interaction.to_string()),
            activation: Some(m.activation.to_string()),
            direction_mode: m.direction_mode.map(|v| v.to_string()),
            granularity: m.granularity.map(|v| v.to_string()),
            simultaneous: Some(m.simultaneous),
            pair_id: m.pair_id.clone(),
            pair_position: m.pair_position.map(|v| v.to_string()),
        }
    }
}

pub(crate) fn parse_opt<T: FromStr>(
    value: Option<&str>,
    field: &str,
) -> Result<Option<T>, SchemaError> {
    match value {
        None => Ok(None),
        Some(v) => T::from_str(v).map(Some).map_err(|_| SchemaError::UnknownEnum {
            field: field.to_string(),
            value: v.to_string(),
        }),
    }
}

pub(crate) fn check_key(binding: &str, key: &str) -> Result<String, SchemaError> {
    if keycodes::registry().is_known(key) {
        Ok(key.to_string())
    } else {
        Err(SchemaError::UnresolvableKey {
            binding: binding.to_string(),
            key: key.to_string(),
        })
    }
}

/// Parses a slot name that must denote an action, never an axis.
pub(crate) fn parse_action_slot(name: &str) -> Result<BindingName, SchemaError> {
    match BindingName::from_str(name) {
        Ok(slot) if !slot.is_axis() => Ok(slot),
        _ => Err(SchemaError::UnknownSlot(name.to_string())),
    }
}

/// Applies raw tags over the defaults for `name`.
pub(crate) fn resolve_meta(name: BindingName, raw: &RawMeta) -> Result<ActionMeta, SchemaError> {
    let field = |f: &str| format!("{}.{}", name, f);

    let control_space = parse_opt(raw.control_space.as_deref(), &field("control_space"))?;
    let mut meta = ActionMeta::defaults_for(name, control_space);

    if let Some(kind) = parse_opt::<ControlKind>(raw.kind.as_deref(), &field("kind"))? {
        if kind != meta.kind {
            return Err(SchemaError::WrongShape {
                binding: name.to_string(),
                reason: format!("declared kind '{}' but bound as '{}'", kind, meta.kind),
            });
        }
    }
    if let Some(v) = parse_opt(raw.behavior.as_deref(), &field("behavior"))? {
        meta.behavior = v;
    }
    if let Some(v) = parse_opt(raw.interaction.as_deref(), &field("interaction"))? {
        meta.interaction = v;
    }
    if let Some(v) = parse_opt(raw.activation.as_deref(), &field("activation"))? {
        meta.activation = v;
    }
    if let Some(v) = parse_opt(raw.direction_mode.as_deref(), &field("direction_mode"))? {
        meta.direction_mode = Some(v);
    }
    if let Some(v) = parse_opt(raw.granularity.as_deref(), &field("granularity"))? {
        meta.granularity = Some(v);
    }
    if let Some(v) = raw.simultaneous {
        meta.simultaneous = v;
    }

    let pair_position = parse_opt(raw.pair_position.as_deref(), &field("pair_position"))?;
    if name.is_axis() && (raw.pair_id.is_some() || pair_position.is_some()) {
        return Err(SchemaError::InvalidPair {
            pair_id: raw.pair_id.clone().unwrap_or_default(),
            reason: format!("'{}' is an axis; only actions can pair", name),
        });
    }
    match (&raw.pair_id, pair_position) {
        (None, None) => {}
        (Some(id), Some(pos)) => {
            meta.pair_id = Some(id.clone());
            meta.pair_position = Some(pos);
        }
        (Some(id), None) => {
            return Err(SchemaError::InvalidPair {
                pair_id: id.clone(),
                reason: format!("'{}' has pair_id but no pair_position", name),
            });
        }
        (None, Some(_)) => {
            return Err(SchemaError::InvalidPair {
                pair_id: String::new(),
                reason: format!("'{}' has pair_position but no pair_id", name),
            });
        }
    }

    Ok(meta)
}

/// An action value: a bare key name or a record carrying `keys`/`key` plus tags.
/// Returns the checked key and the tags, if any were present.
pub(crate) fn parse_action_value(
    slot: BindingName,
    value: &Value,
) -> Result<(String, Option<RawMeta>), SchemaError> {
    match value {
        Value::String(key) => Ok((check_key(slot.as_ref(), key)?, None)),
        Value::Object(map) => {
            let key_value = map.get("keys").or_else(|| map.get("key"));
            let key = match key_value {
                Some(Value::String(k)) => k,
                Some(_) => {
                    return Err(SchemaError::WrongShape {
                        binding: slot.to_string(),
                        reason: "action key must be a single key name".to_string(),
                    })
                }
                None => return Err(SchemaError::MissingKey(slot.to_string())),
            };
            let key = check_key(slot.as_ref(), key)?;
            let tags: RawMeta = serde_json::from_value(value.clone())
                .map_err(|e| SchemaError::Malformed(format!("{}: {}", slot, e)))?;
            Ok((key, Some(tags)))
        }
        _ => Err(SchemaError::WrongShape {
            binding: slot.to_string(),
            reason: "expected a key name or a record".to_string(),
        }),
    }
}

/// Bindings and metadata produced by one of the two shape parsers.
#[derive(Debug, Default)]
pub(crate) struct ParsedShape {
    pub bindings: BTreeMap<BindingName, Binding>,
    pub meta: BTreeMap<BindingName, ActionMeta>,
}
