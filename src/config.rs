use crate::error::{TfResult, TouchForgeError};
use crate::geometry::MIN_TOUCH_TARGET;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sizing coefficients for the geometry engine. Every control dimension is
/// `min_dim * ratio` clamped to `[min, max]`.
#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutTuning {
    // === MOVEMENT CONTROL ===
    #[arg(long, default_value_t = 0.17)]
    pub movement_ratio: f64,
    #[arg(long, default_value_t = 64.0)]
    pub movement_min: f64,
    #[arg(long, default_value_t = 112.0)]
    pub movement_max: f64,

    // === ACTIONS ===
    #[arg(long, default_value_t = 0.14)]
    pub action_ratio: f64,
    #[arg(long, default_value_t = 56.0)]
    pub action_min: f64,
    #[arg(long, default_value_t = 96.0)]
    pub action_max: f64,

    #[arg(long, default_value_t = 0.12)]
    pub small_action_ratio: f64,
    #[arg(long, default_value_t = 48.0)]
    pub small_action_min: f64,
    #[arg(long, default_value_t = 80.0)]
    pub small_action_max: f64,

    // === GAPS ===
    #[arg(long, default_value_t = 0.05)]
    pub edge_padding_ratio: f64,
    #[arg(long, default_value_t = 16.0)]
    pub edge_padding_min: f64,
    #[arg(long, default_value_t = 32.0)]
    pub edge_padding_max: f64,

    #[arg(long, default_value_t = 0.03)]
    pub spacing_ratio: f64,
    #[arg(long, default_value_t = 10.0)]
    pub spacing_min: f64,
    #[arg(long, default_value_t = 20.0)]
    pub spacing_max: f64,

    // Floor for every control, including compact packing. Never below 48.
    #[arg(long, default_value_t = 48.0)]
    pub min_touch_target: f64,

    // Spacing used by the tight re-pack
    #[arg(long, default_value_t = 6.0)]
    pub tight_spacing: f64,

    // === ARC ===
    // Radius as a multiple of min_dim; rise cap as a fraction of action size
    #[arg(long, default_value_t = 2.5)]
    pub arc_radius_factor: f64,
    #[arg(long, default_value_t = 0.6)]
    pub arc_max_rise_factor: f64,

    // === SESSION ===
    // Fraction of a stick's radius that registers no direction
    #[arg(long, default_value_t = 0.2)]
    pub stick_deadzone: f64,
}

impl Default for LayoutTuning {
    fn default() -> Self {
        Self {
            movement_ratio: 0.17,
            movement_min: 64.0,
            movement_max: 112.0,
            action_ratio: 0.14,
            action_min: 56.0,
            action_max: 96.0,
            small_action_ratio: 0.12,
            small_action_min: 48.0,
            small_action_max: 80.0,
            edge_padding_ratio: 0.05,
            edge_padding_min: 16.0,
            edge_padding_max: 32.0,
            spacing_ratio: 0.03,
            spacing_min: 10.0,
            spacing_max: 20.0,
            min_touch_target: 48.0,
            tight_spacing: 6.0,
            arc_radius_factor: 2.5,
            arc_max_rise_factor: 0.6,
            stick_deadzone: 0.2,
        }
    }
}

impl LayoutTuning {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> TfResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            TouchForgeError::Config(format!("Failed to read tuning file {}: {}", path.display(), e))
        })?;
        let tuning: LayoutTuning = serde_json::from_str(&content)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Copies only the flags the user actually typed, leaving file values
    /// in place for everything else.
    pub fn merge_from_cli(&mut self, cli_tuning: &LayoutTuning, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident, $arg_name:expr) => {
                if matches.value_source($arg_name) == Some(ValueSource::CommandLine) {
                    self.$field = cli_tuning.$field;
                }
            };
        }

        update_if_present!(movement_ratio, "movement_ratio");
        update_if_present!(movement_min, "movement_min");
        update_if_present!(movement_max, "movement_max");

        update_if_present!(action_ratio, "action_ratio");
        update_if_present!(action_min, "action_min");
        update_if_present!(action_max, "action_max");
        update_if_present!(small_action_ratio, "small_action_ratio");
        update_if_present!(small_action_min, "small_action_min");
        update_if_present!(small_action_max, "small_action_max");

        update_if_present!(edge_padding_ratio, "edge_padding_ratio");
        update_if_present!(edge_padding_min, "edge_padding_min");
        update_if_present!(edge_padding_max, "edge_padding_max");
        update_if_present!(spacing_ratio, "spacing_ratio");
        update_if_present!(spacing_min, "spacing_min");
        update_if_present!(spacing_max, "spacing_max");

        update_if_present!(min_touch_target, "min_touch_target");
        update_if_present!(tight_spacing, "tight_spacing");
        update_if_present!(arc_radius_factor, "arc_radius_factor");
        update_if_present!(arc_max_rise_factor, "arc_max_rise_factor");
        update_if_present!(stick_deadzone, "stick_deadzone");
    }

    pub fn validate(&self) -> TfResult<()> {
        let ranges = [
            ("movement", self.movement_min, self.movement_max),
            ("action", self.action_min, self.action_max),
            ("small_action", self.small_action_min, self.small_action_max),
            ("edge_padding", self.edge_padding_min, self.edge_padding_max),
            ("spacing", self.spacing_min, self.spacing_max),
        ];
        for (name, min, max) in ranges {
            if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
                return Err(TouchForgeError::Config(format!(
                    "{}: invalid range [{}, {}]",
                    name, min, max
                )));
            }
        }

        let ratios = [
            self.movement_ratio,
            self.action_ratio,
            self.small_action_ratio,
            self.edge_padding_ratio,
            self.spacing_ratio,
            self.arc_radius_factor,
        ];
        if ratios.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(TouchForgeError::Config("ratios must be positive".to_string()));
        }
        let control_floors = [
            ("min_touch_target", self.min_touch_target),
            ("movement_min", self.movement_min),
            ("action_min", self.action_min),
            ("small_action_min", self.small_action_min),
        ];
        if let Some((name, v)) = control_floors
            .iter()
            .find(|(_, v)| !v.is_finite() || *v < MIN_TOUCH_TARGET)
        {
            return Err(TouchForgeError::Config(format!(
                "{} is {} but no control may be smaller than {} px",
                name, v, MIN_TOUCH_TARGET
            )));
        }
        if self.tight_spacing < 0.0 {
            return Err(TouchForgeError::Config("tight_spacing must be non-negative".to_string()));
        }
        if !(0.0..1.0).contains(&self.stick_deadzone) || self.arc_max_rise_factor < 0.0 {
            return Err(TouchForgeError::Config(
                "stick_deadzone must lie in [0, 1) and arc_max_rise_factor be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
