//! Placement of planned controls inside a viewport.
//!
//! Positions and sizes live on a 0.1 px grid, so one-decimal rounding of the
//! output is lossless. Packing reserves each control a slot rounded up to the
//! 0.2 px grid; the slot's half-width is on the 0.1 grid and the control sits
//! centred inside it.

use crate::config::LayoutTuning;
use crate::error::{GeometryInvariantError, SchemaError};
use crate::schema::{Binding, BindingName};
use crate::selector::{ControlPlan, ControlSpec, ControlType, PairTag, SizeClass};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;
use typed_builder::TypedBuilder;

const EPS: f64 = 1e-6;

/// Smallest touch target any viewport or tuning may produce.
pub const MIN_TOUCH_TARGET: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SafeArea {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub right: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub left: f64,
}

impl SafeArea {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Parses `T,R,B,L`.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| SchemaError::InvalidViewport(format!("bad safe area '{}'", s)))?;
        match parts.as_slice() {
            [t, r, b, l] => Ok(Self::new(*t, *r, *b, *l)),
            _ => Err(SchemaError::InvalidViewport(format!(
                "safe area needs 4 values (T,R,B,L), got {}",
                parts.len()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[builder(default)]
    #[serde(default)]
    pub safe_area: SafeArea,
}

impl Viewport {
    pub fn validate(&self) -> Result<(), SchemaError> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(SchemaError::InvalidViewport(format!("width {}", self.width)));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(SchemaError::InvalidViewport(format!("height {}", self.height)));
        }
        let sa = self.safe_area;
        for (side, v) in [("top", sa.top), ("right", sa.right), ("bottom", sa.bottom), ("left", sa.left)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(SchemaError::InvalidViewport(format!("safe area {} {}", side, v)));
            }
        }
        Ok(())
    }

    pub fn min_dim(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Which packing strategy produced the final placement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Packing {
    Standard,
    Tight,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutMetrics {
    pub width: f64,
    pub height: f64,
    pub safe_area: SafeArea,
    pub edge_padding: f64,
    pub spacing: f64,
    pub min_dim: f64,
    pub movement_size: f64,
    pub action_size: f64,
    pub small_action_size: f64,
    pub packing: Packing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDescriptor {
    pub id: String,
    pub role: BindingName,
    #[serde(rename = "type")]
    pub control_type: ControlType,
    pub keys: Binding,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<PairTag>,
}

impl ButtonDescriptor {
    pub fn half(&self) -> f64 {
        self.size / 2.0
    }

    pub fn left(&self) -> f64 {
        self.x - self.half()
    }

    pub fn right(&self) -> f64 {
        self.x + self.half()
    }

    pub fn top(&self) -> f64 {
        self.y - self.half()
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.half()
    }

    pub fn overlaps(&self, other: &ButtonDescriptor) -> bool {
        let reach = self.half() + other.half();
        (self.x - other.x).abs() < reach - EPS && (self.y - other.y).abs() < reach - EPS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub buttons: Vec<ButtonDescriptor>,
    pub metrics: LayoutMetrics,
}

// --- grid snapping ---

fn to_grid(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn floor_step(v: f64, step: f64) -> f64 {
    to_grid((v / step + EPS).floor() * step)
}

fn ceil_step(v: f64, step: f64) -> f64 {
    to_grid((v / step - EPS).ceil() * step)
}

fn size_on_grid(raw: f64, floor: f64) -> f64 {
    let s = to_grid(raw);
    if s < floor {
        ceil_step(floor, 0.1)
    } else {
        s
    }
}

/// Room reserved for a control of `size`.
fn slot(size: f64) -> f64 {
    ceil_step(size, 0.2)
}

fn touch_floor(tuning: &LayoutTuning) -> f64 {
    tuning.min_touch_target.max(MIN_TOUCH_TARGET)
}

/// Usable region after safe area and edge padding.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

#[derive(Debug, Clone, Copy)]
struct Strategy {
    packing: Packing,
    spacing: f64,
    arc: bool,
    movement: f64,
    action: f64,
    small: f64,
}

impl Strategy {
    fn size_of(&self, class: SizeClass) -> f64 {
        match class {
            SizeClass::Movement => self.movement,
            SizeClass::Standard => self.action,
            SizeClass::Small => self.small,
        }
    }
}

fn scaled(min_dim: f64, ratio: f64, min: f64, max: f64) -> f64 {
    (min_dim * ratio).clamp(min, max)
}

fn strategies(min_dim: f64, spacing: f64, tuning: &LayoutTuning) -> [Strategy; 3] {
    let floor = touch_floor(tuning);
    let movement = size_on_grid(
        scaled(min_dim, tuning.movement_ratio, tuning.movement_min, tuning.movement_max),
        floor,
    );
    let action = size_on_grid(
        scaled(min_dim, tuning.action_ratio, tuning.action_min, tuning.action_max),
        floor,
    );
    let small = size_on_grid(
        scaled(
            min_dim,
            tuning.small_action_ratio,
            tuning.small_action_min,
            tuning.small_action_max,
        ),
        floor,
    );
    let tight = to_grid(tuning.tight_spacing.min(spacing));
    let compact = ceil_step(floor, 0.1);

    [
        Strategy {
            packing: Packing::Standard,
            spacing,
            arc: true,
            movement,
            action,
            small,
        },
        Strategy {
            packing: Packing::Tight,
            spacing: tight,
            arc: false,
            movement,
            action,
            small,
        },
        Strategy {
            packing: Packing::Compact,
            spacing: tight,
            arc: false,
            movement: movement.min(action).max(compact),
            action: compact,
            small: compact,
        },
    ]
}

fn descriptor(spec: &ControlSpec, x: f64, y: f64, size: f64) -> ButtonDescriptor {
    ButtonDescriptor {
        id: spec.id.clone(),
        role: spec.role,
        control_type: spec.control_type,
        keys: spec.keys.clone(),
        x: to_grid(x),
        y: to_grid(y),
        size,
        pair: spec.pair.clone(),
    }
}

struct Packer<'a> {
    strategy: Strategy,
    edges: Bounds,
    arc_radius: f64,
    max_rise: f64,
    /// Right and top edges of the movement control, if any.
    left_cluster: Option<(f64, f64)>,
    plan: &'a ControlPlan,
}

impl Packer<'_> {
    fn pack(&self) -> Result<Vec<ButtonDescriptor>, String> {
        let s = self.strategy;
        let mut buttons = Vec::new();

        if let Some(spec) = &self.plan.movement {
            let size = s.size_of(spec.size_class);
            let half = slot(size) / 2.0;
            buttons.push(descriptor(
                spec,
                self.edges.left + half,
                self.edges.bottom - half,
                size,
            ));
        }

        let mut row_bottom = self.edges.bottom;
        let mut row_top = f64::INFINITY;
        let mut cursor = self.edges.right;
        let mut anchor_x: Option<f64> = None;

        for unit in &self.plan.right {
            let members = unit.members();
            let size = members
                .iter()
                .map(|m| s.size_of(m.size_class))
                .fold(0.0, f64::max);
            let step = slot(size);
            let count = members.len() as f64;
            let width = step * count + s.spacing * (count - 1.0);

            let (left, lift) = loop {
                let left = to_grid(cursor - width);
                let centre = left + width / 2.0;
                let anchor = anchor_x.unwrap_or(centre);
                let lift = if s.arc {
                    let dx = anchor - centre;
                    ceil_step((dx * dx / (2.0 * self.arc_radius)).min(self.max_rise), 0.1)
                } else {
                    0.0
                };
                let bottom = row_bottom - lift;

                let min_x = match self.left_cluster {
                    Some((lc_right, lc_top)) if bottom > lc_top - s.spacing + EPS => {
                        lc_right + s.spacing
                    }
                    _ => self.edges.left,
                };

                if left >= min_x - EPS {
                    break (left, lift);
                }
                if anchor_x.is_none() {
                    // An empty row that cannot fit beside the movement control
                    // restarts above it.
                    match self.left_cluster {
                        Some((_, lc_top)) if row_bottom > lc_top - s.spacing + EPS => {
                            row_bottom = to_grid(lc_top - s.spacing);
                            continue;
                        }
                        _ => {
                            return Err(format!("'{}' is wider than the safe region", members[0].id));
                        }
                    }
                }
                // Wrap upward into a fresh row.
                row_bottom = to_grid(row_top - s.spacing);
                row_top = f64::INFINITY;
                cursor = self.edges.right;
                anchor_x = None;
            };

            let centre_y = row_bottom - lift - step / 2.0;
            let top = to_grid(centre_y - step / 2.0);
            if top < self.edges.top - EPS {
                return Err(format!("'{}' would cross the top edge", members[0].id));
            }

            let mut x = left + step / 2.0;
            for member in &members {
                buttons.push(descriptor(member, x, centre_y, size));
                x += step + s.spacing;
            }

            anchor_x.get_or_insert(left + width / 2.0);
            row_top = row_top.min(top);
            cursor = to_grid(left - s.spacing);
        }

        Ok(buttons)
    }
}

/// Bounding-box and overlap checks on the final rounded values.
fn verify(
    buttons: &[ButtonDescriptor],
    bounds: &Bounds,
    min_size: f64,
) -> Result<(), (String, String)> {
    for b in buttons {
        if b.size < min_size - EPS {
            return Err((b.id.clone(), format!("size {} below {}", b.size, min_size)));
        }
        if b.left() < bounds.left - EPS
            || b.right() > bounds.right + EPS
            || b.top() < bounds.top - EPS
            || b.bottom() > bounds.bottom + EPS
        {
            return Err((b.id.clone(), "outside the safe region".to_string()));
        }
    }
    for (i, a) in buttons.iter().enumerate() {
        if let Some(b) = buttons[i + 1..].iter().find(|b| a.overlaps(b)) {
            return Err((a.id.clone(), format!("overlaps '{}'", b.id)));
        }
    }
    Ok(())
}

pub fn place(
    plan: &ControlPlan,
    viewport: &Viewport,
    tuning: &LayoutTuning,
) -> Result<Placement, GeometryInvariantError> {
    let sa = viewport.safe_area;
    let min_dim = viewport.min_dim();

    let edge_padding = ceil_step(
        scaled(min_dim, tuning.edge_padding_ratio, tuning.edge_padding_min, tuning.edge_padding_max),
        0.1,
    );
    let spacing = to_grid(scaled(
        min_dim,
        tuning.spacing_ratio,
        tuning.spacing_min,
        tuning.spacing_max,
    ));

    let bounds = Bounds {
        left: sa.left + edge_padding,
        right: viewport.width - sa.right - edge_padding,
        top: sa.top + edge_padding,
        bottom: viewport.height - sa.bottom - edge_padding,
    };
    let edges = Bounds {
        left: ceil_step(bounds.left, 0.1),
        right: floor_step(bounds.right, 0.1),
        top: ceil_step(bounds.top, 0.1),
        bottom: floor_step(bounds.bottom, 0.1),
    };

    let mut last_failure = ("layout".to_string(), "no packing attempted".to_string());

    for strategy in strategies(min_dim, spacing, tuning) {
        let left_cluster = plan.movement.as_ref().map(|spec| {
            let size = slot(strategy.size_of(spec.size_class));
            (to_grid(edges.left + size), to_grid(edges.bottom - size))
        });
        let packer = Packer {
            strategy,
            edges,
            arc_radius: tuning.arc_radius_factor * min_dim,
            max_rise: tuning.arc_max_rise_factor * strategy.action,
            left_cluster,
            plan,
        };

        let outcome = packer
            .pack()
            .map_err(|reason| ("layout".to_string(), reason))
            .and_then(|buttons| {
                verify(&buttons, &bounds, touch_floor(tuning)).map(|_| buttons)
            });

        match outcome {
            Ok(buttons) => {
                debug!(
                    "Placed {} controls in {}x{} with {} packing",
                    buttons.len(),
                    viewport.width,
                    viewport.height,
                    strategy.packing
                );
                return Ok(Placement {
                    buttons,
                    metrics: LayoutMetrics {
                        width: viewport.width,
                        height: viewport.height,
                        safe_area: sa,
                        edge_padding,
                        spacing: strategy.spacing,
                        min_dim,
                        movement_size: strategy.movement,
                        action_size: strategy.action,
                        small_action_size: strategy.small,
                        packing: strategy.packing,
                    },
                });
            }
            Err(failure) => {
                debug!("{} packing failed: {} {}", strategy.packing, failure.0, failure.1);
                last_failure = failure;
            }
        }
    }

    Err(GeometryInvariantError {
        control: last_failure.0,
        width: viewport.width,
        height: viewport.height,
        reason: last_failure.1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_helpers() {
        assert_eq!(floor_step(58.33, 0.2), 58.2);
        assert_eq!(ceil_step(16.01, 0.1), 16.1);
        assert_eq!(ceil_step(19.5, 0.1), 19.5);
        assert_eq!(size_on_grid(40.0, 48.0), 48.0);
        assert_eq!(size_on_grid(390.0 * 0.17, 48.0), 66.3);
        assert_eq!(slot(66.3), 66.4);
        assert_eq!(slot(48.0), 48.0);
    }

    #[test]
    fn test_floor_ignores_smaller_tuned_target() {
        let tuning = LayoutTuning {
            min_touch_target: 20.0,
            small_action_min: 20.0,
            ..LayoutTuning::default()
        };
        assert_eq!(touch_floor(&tuning), MIN_TOUCH_TARGET);
        for strategy in strategies(320.0, 10.0, &tuning) {
            assert!(strategy.small >= MIN_TOUCH_TARGET);
            assert!(strategy.action >= MIN_TOUCH_TARGET);
        }
    }

    #[test]
    fn test_safe_area_parse() {
        assert_eq!(SafeArea::parse("47,0,34,0").unwrap(), SafeArea::new(47.0, 0.0, 34.0, 0.0));
        assert!(SafeArea::parse("1,2,3").is_err());
    }

    #[test]
    fn test_viewport_rejects_negative_inset() {
        let vp = Viewport::builder()
            .width(390.0)
            .height(844.0)
            .safe_area(SafeArea::new(0.0, -1.0, 0.0, 0.0))
            .build();
        assert!(vp.validate().is_err());
    }
}
