use crate::config::LayoutTuning;
use crate::error::TfResult;
use crate::geometry::{self, ButtonDescriptor, LayoutMetrics, Viewport};
use crate::schema::{self, ActionMeta, Archetype, Binding, BindingName, CanonicalConfig, SchemaInput};
use crate::selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use typed_builder::TypedBuilder;

/// Everything a renderer needs for one viewport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub layout: Archetype,
    /// Bindings as the controls use them. A decoupled `move` has no vertical
    /// keys and is dropped when nothing horizontal remains.
    pub bindings: BTreeMap<BindingName, Binding>,
    pub action_meta: BTreeMap<BindingName, ActionMeta>,
    pub buttons: Vec<ButtonDescriptor>,
    pub metrics: LayoutMetrics,
}

impl LayoutResult {
    pub fn button(&self, role: BindingName) -> Option<&ButtonDescriptor> {
        self.buttons.iter().find(|b| b.role == role)
    }
}

/// Stateless engine. Safe to share across threads.
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct LayoutEngine {
    #[builder(default)]
    pub tuning: LayoutTuning,
}

impl LayoutEngine {
    pub fn build_layout(&self, input: &SchemaInput, viewport: &Viewport) -> TfResult<LayoutResult> {
        viewport.validate()?;
        let config = schema::normalize(input)?;
        self.build_from_config(&config, viewport)
    }

    pub fn build_from_config(
        &self,
        config: &CanonicalConfig,
        viewport: &Viewport,
    ) -> TfResult<LayoutResult> {
        viewport.validate()?;

        let archetype = selector::select(config);
        let plan = selector::plan(config, archetype);
        let placement = geometry::place(&plan, viewport, &self.tuning)?;

        let mut bindings = config.bindings.clone();
        let mut action_meta = config.action_meta.clone();
        match &plan.movement {
            Some(movement) => {
                bindings.insert(BindingName::Move, movement.keys.clone());
            }
            None => {
                if bindings.remove(&BindingName::Move).is_some() {
                    action_meta.remove(&BindingName::Move);
                    debug!("move has no keys left after planning; dropped from bindings");
                }
            }
        }

        debug!(
            "Built {} layout with {} buttons ({} packing)",
            archetype,
            placement.buttons.len(),
            placement.metrics.packing
        );

        Ok(LayoutResult {
            layout: archetype,
            bindings,
            action_meta,
            buttons: placement.buttons,
            metrics: placement.metrics,
        })
    }
}

/// Normalize, select, plan and place with default tuning.
pub fn build_layout(input: &SchemaInput, viewport: &Viewport) -> TfResult<LayoutResult> {
    LayoutEngine::default().build_layout(input, viewport)
}
