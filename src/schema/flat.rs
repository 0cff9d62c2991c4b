//! Parser for the flat shape: `bindings` plus `actionMeta`.

use super::analysis::parse_axis_keys;
use super::raw::{parse_action_slot, parse_action_value, resolve_meta, ParsedShape, RawMeta};
use super::types::{Binding, BindingName};
use crate::error::SchemaError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Metadata entries are returned separately from bindings so the caller can
/// apply per-slot precedence against the analysis shape.
pub(crate) struct FlatShape {
    pub bindings: BTreeMap<BindingName, Binding>,
    /// Tags carried inline on action records.
    pub inline_meta: BTreeMap<BindingName, RawMeta>,
    /// Entries from the `actionMeta` table.
    pub meta: BTreeMap<BindingName, RawMeta>,
}

pub(crate) fn parse(
    bindings: Option<&BTreeMap<String, Value>>,
    action_meta: Option<&BTreeMap<String, RawMeta>>,
) -> Result<FlatShape, SchemaError> {
    let mut out = FlatShape {
        bindings: BTreeMap::new(),
        inline_meta: BTreeMap::new(),
        meta: BTreeMap::new(),
    };

    for (name, value) in bindings.into_iter().flatten() {
        let slot = parse_binding_name(name)?;
        if slot.is_axis() {
            let keys: BTreeMap<String, String> = match value {
                Value::Object(_) => serde_json::from_value(value.clone()).map_err(|_| {
                    SchemaError::WrongShape {
                        binding: name.clone(),
                        reason: "axis directions must map to key names".to_string(),
                    }
                })?,
                _ => {
                    return Err(SchemaError::WrongShape {
                        binding: name.clone(),
                        reason: "axis binding must be a direction map".to_string(),
                    })
                }
            };
            let axis = parse_axis_keys(name, Some(&keys))?;
            out.bindings.insert(slot, Binding::Axis(axis));
        } else {
            let (key, tags) = parse_action_value(slot, value)?;
            out.bindings.insert(slot, Binding::Key(key));
            if let Some(tags) = tags {
                out.inline_meta.insert(slot, tags);
            }
        }
    }

    for (name, raw) in action_meta.into_iter().flatten() {
        let slot = parse_binding_name(name)?;
        out.meta.insert(slot, raw.clone());
    }

    Ok(out)
}

impl FlatShape {
    /// Resolved metadata for every slot that has a flat entry. A table entry
    /// replaces the inline tags of the same slot wholesale.
    pub(crate) fn resolved_meta(&self) -> Result<ParsedShape, SchemaError> {
        let mut parsed = ParsedShape {
            bindings: self.bindings.clone(),
            meta: BTreeMap::new(),
        };
        for (slot, raw) in &self.inline_meta {
            parsed.meta.insert(*slot, resolve_meta(*slot, raw)?);
        }
        for (slot, raw) in &self.meta {
            parsed.meta.insert(*slot, resolve_meta(*slot, raw)?);
        }
        Ok(parsed)
    }
}

fn parse_binding_name(name: &str) -> Result<BindingName, SchemaError> {
    match BindingName::from_str(name) {
        Ok(n) if n.is_axis() => Ok(n),
        _ => parse_action_slot(name),
    }
}
