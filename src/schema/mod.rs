//! Schema normalization: both accepted input shapes converge to one
//! `CanonicalConfig`. Nothing downstream learns which shape was supplied.

mod analysis;
mod flat;
mod raw;
pub mod types;

pub use raw::{RawAxis, RawMeta, SchemaInput};
pub use types::*;

use crate::error::SchemaError;
use raw::{parse_opt, ParsedShape};
use std::collections::BTreeMap;
use tracing::debug;

pub fn normalize(input: &SchemaInput) -> Result<CanonicalConfig, SchemaError> {
    let mut merged = if input.has_analysis_shape() {
        analysis::parse(input.axes.as_deref(), input.actions.as_ref())?
    } else {
        ParsedShape::default()
    };

    if input.has_flat_shape() {
        let flat = flat::parse(input.bindings.as_ref(), input.action_meta.as_ref())?;
        let resolved = flat.resolved_meta()?;

        for (slot, binding) in resolved.bindings {
            if merged.bindings.insert(slot, binding).is_some() {
                debug!("Flat binding '{}' replaces analysis binding", slot);
                merged.meta.remove(&slot);
            }
        }
        for (slot, meta) in resolved.meta {
            if !merged.bindings.contains_key(&slot) {
                return Err(SchemaError::MetaWithoutBinding(slot.to_string()));
            }
            merged.meta.insert(slot, meta);
        }
    }

    let mut action_meta = merged.meta;
    for name in merged.bindings.keys() {
        action_meta
            .entry(*name)
            .or_insert_with(|| ActionMeta::defaults_for(*name, None));
    }

    validate_pairs(&action_meta)?;

    let layout = parse_opt::<LayoutPreference>(input.layout.as_deref(), "layout")?.unwrap_or_default();

    Ok(CanonicalConfig {
        layout,
        bindings: merged.bindings,
        action_meta,
    })
}

/// Each `pair_id` must name exactly two actions at opposite positions.
fn validate_pairs(meta: &BTreeMap<BindingName, ActionMeta>) -> Result<(), SchemaError> {
    let mut groups: BTreeMap<&str, Vec<(BindingName, PairPosition)>> = BTreeMap::new();
    for (name, m) in meta {
        if let Some((id, pos)) = m.pair() {
            groups.entry(id).or_default().push((*name, pos));
        }
    }

    for (id, members) in groups {
        let invalid = |reason: String| SchemaError::InvalidPair {
            pair_id: id.to_string(),
            reason,
        };
        match members.as_slice() {
            [(_, a), (_, b)] if a != b => {}
            [(x, _), (y, _)] => {
                return Err(invalid(format!("'{}' and '{}' share a position", x, y)));
            }
            _ => {
                return Err(invalid(format!("expected 2 members, found {}", members.len())));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> SchemaInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lone_pair_member_is_rejected() {
        let err = normalize(&input(json!({
            "bindings": { "primary": "KeyZ" },
            "actionMeta": { "primary": { "pair_id": "fire", "pair_position": "left" } }
        })))
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPair { .. }));
    }

    #[test]
    fn test_defaults_fill_every_binding() {
        let config = normalize(&input(json!({
            "bindings": { "move": { "left": "ArrowLeft", "right": "ArrowRight" }, "jump": "Space" }
        })))
        .unwrap();
        assert_eq!(config.action_meta.len(), config.bindings.len());
        assert_eq!(config.meta(BindingName::Jump).unwrap().interaction, Interaction::Tap);
    }
}
