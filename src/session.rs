//! Runtime pointer tracking for one set of on-screen controls.
//!
//! A `ControlSession` turns pointer events into keyboard events. All state is
//! owned by the session, so two control sets never share pointer bookkeeping.

use crate::api::{LayoutEngine, LayoutResult};
use crate::error::TfResult;
use crate::geometry::{ButtonDescriptor, Viewport};
use crate::keycodes::{self, KeyDescriptor};
use crate::schema::{Activation, Binding, Direction, SchemaInput};
use crate::selector::ControlType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

pub type PointerId = u32;

/// sin(22.5°): a joystick reports a diagonal once the minor component passes it.
const DIAGONAL_THRESHOLD: f64 = 0.382_683_432_365_089_8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    Down,
    Up,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub descriptor: KeyDescriptor,
    pub pointer: Option<PointerId>,
}

#[derive(Debug, Default)]
pub struct ControlSession {
    buttons: Vec<ButtonDescriptor>,
    latching: HashSet<String>,
    descriptors: HashMap<String, KeyDescriptor>,
    deadzone: f64,
    /// Keys each active contact is holding.
    pointers: HashMap<PointerId, BTreeSet<String>>,
    /// Number of contacts holding each key.
    holds: HashMap<String, usize>,
    latched: BTreeSet<String>,
}

impl ControlSession {
    pub fn new(layout: &LayoutResult, deadzone: f64) -> TfResult<Self> {
        let mut descriptors = HashMap::new();
        for button in &layout.buttons {
            for key in button.keys.keys() {
                descriptors.insert(key.to_string(), keycodes::resolve_key_descriptor(key)?);
            }
        }

        let latching = layout
            .buttons
            .iter()
            .filter(|b| {
                layout
                    .action_meta
                    .get(&b.role)
                    .is_some_and(|m| m.activation == Activation::Latch)
            })
            .map(|b| b.id.clone())
            .collect();

        Ok(Self {
            buttons: layout.buttons.clone(),
            latching,
            descriptors,
            deadzone,
            ..Self::default()
        })
    }

    /// Builds the controls for `input`, or an inert session when the layout
    /// cannot be built. The host keeps its keyboard either way.
    pub fn from_schema_or_empty(
        engine: &LayoutEngine,
        input: &SchemaInput,
        viewport: &Viewport,
    ) -> Self {
        let built = engine
            .build_layout(input, viewport)
            .and_then(|layout| Self::new(&layout, engine.tuning.stick_deadzone));
        match built {
            Ok(session) => session,
            Err(e) => {
                warn!("Touch controls disabled, falling back to keyboard only: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.buttons.is_empty()
    }

    pub fn buttons(&self) -> &[ButtonDescriptor] {
        &self.buttons
    }

    /// Keys currently down, held or latched, sorted by name.
    pub fn held_keys(&self) -> Vec<&str> {
        let held: BTreeSet<&str> = self
            .holds
            .keys()
            .map(String::as_str)
            .chain(self.latched.iter().map(String::as_str))
            .collect();
        held.into_iter().collect()
    }

    pub fn pointer_down(&mut self, pointer: PointerId, x: f64, y: f64) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        // A reused id without an intervening up is treated as a new contact.
        if self.pointers.contains_key(&pointer) {
            events.extend(self.release_pointer(pointer));
        }

        let Some(button) = self.hit(x, y) else {
            return events;
        };

        if self.latching.contains(&button.id) {
            let keys: Vec<String> = button.keys.keys().iter().map(|k| k.to_string()).collect();
            for key in keys {
                events.extend(self.toggle_latch(&key, pointer));
            }
            self.pointers.insert(pointer, BTreeSet::new());
            return events;
        }

        let keys = self.keys_at(button, x, y);
        self.pointers.insert(pointer, BTreeSet::new());
        events.extend(self.transition(pointer, keys));
        events
    }

    pub fn pointer_move(&mut self, pointer: PointerId, x: f64, y: f64) -> Vec<KeyEvent> {
        if !self.pointers.contains_key(&pointer) {
            return Vec::new();
        }
        let keys = match self.hit(x, y) {
            Some(button) if !self.latching.contains(&button.id) => self.keys_at(button, x, y),
            _ => BTreeSet::new(),
        };
        self.transition(pointer, keys)
    }

    pub fn pointer_up(&mut self, pointer: PointerId) -> Vec<KeyEvent> {
        self.release_pointer(pointer)
    }

    pub fn pointer_cancel(&mut self, pointer: PointerId) -> Vec<KeyEvent> {
        debug!("Pointer {} cancelled", pointer);
        self.release_pointer(pointer)
    }

    /// Releases every held and latched key. Call on teardown.
    pub fn release_all(&mut self) -> Vec<KeyEvent> {
        let mut ids: Vec<PointerId> = self.pointers.keys().copied().collect();
        ids.sort_unstable();
        let mut events: Vec<KeyEvent> = ids
            .into_iter()
            .flat_map(|id| self.release_pointer(id))
            .collect();

        let latched = std::mem::take(&mut self.latched);
        events.extend(latched.iter().filter_map(|k| self.event(KeyEventKind::Up, k, None)));
        events
    }

    fn release_pointer(&mut self, pointer: PointerId) -> Vec<KeyEvent> {
        if !self.pointers.contains_key(&pointer) {
            return Vec::new();
        }
        let events = self.transition(pointer, BTreeSet::new());
        self.pointers.remove(&pointer);
        events
    }

    /// Moves `pointer` to holding exactly `next`, emitting the difference.
    fn transition(&mut self, pointer: PointerId, next: BTreeSet<String>) -> Vec<KeyEvent> {
        let prev = self.pointers.get(&pointer).cloned().unwrap_or_default();
        let mut events = Vec::new();

        for key in prev.difference(&next) {
            let remaining = match self.holds.get_mut(key) {
                Some(count) => {
                    *count -= 1;
                    *count
                }
                None => continue,
            };
            if remaining == 0 {
                self.holds.remove(key);
                if !self.latched.contains(key) {
                    events.extend(self.event(KeyEventKind::Up, key, Some(pointer)));
                }
            }
        }

        for key in next.difference(&prev) {
            let count = self.holds.entry(key.clone()).or_insert(0);
            *count += 1;
            if *count == 1 && !self.latched.contains(key) {
                events.extend(self.event(KeyEventKind::Down, key, Some(pointer)));
            }
        }

        self.pointers.insert(pointer, next);
        events
    }

    /// A key held by a contact stays down across latch toggles; only the
    /// edge of the combined state is reported.
    fn toggle_latch(&mut self, key: &str, pointer: PointerId) -> Option<KeyEvent> {
        let kind = if self.latched.remove(key) {
            KeyEventKind::Up
        } else {
            self.latched.insert(key.to_string());
            KeyEventKind::Down
        };
        if self.holds.contains_key(key) {
            return None;
        }
        self.event(kind, key, Some(pointer))
    }

    fn event(&self, kind: KeyEventKind, key: &str, pointer: Option<PointerId>) -> Option<KeyEvent> {
        self.descriptors.get(key).map(|d| KeyEvent {
            kind,
            descriptor: d.clone(),
            pointer,
        })
    }

    /// Topmost control whose circle contains the point. Later buttons were
    /// placed later and win ties.
    fn hit(&self, x: f64, y: f64) -> Option<&ButtonDescriptor> {
        self.buttons
            .iter()
            .rev()
            .find(|b| (x - b.x).hypot(y - b.y) <= b.half())
    }

    fn keys_at(&self, button: &ButtonDescriptor, x: f64, y: f64) -> BTreeSet<String> {
        match &button.keys {
            Binding::Key(k) => BTreeSet::from([k.clone()]),
            Binding::Axis(axis) => {
                let dx = x - button.x;
                let dy = y - button.y;
                let dist = dx.hypot(dy);
                if dist < self.deadzone * button.half() {
                    return BTreeSet::new();
                }

                let mut dirs = Vec::new();
                if button.control_type == ControlType::Dpad {
                    if dx.abs() >= dy.abs() {
                        dirs.push(if dx < 0.0 { Direction::Left } else { Direction::Right });
                    } else {
                        dirs.push(if dy < 0.0 { Direction::Up } else { Direction::Down });
                    }
                } else {
                    let threshold = dist * DIAGONAL_THRESHOLD;
                    if dx < -threshold {
                        dirs.push(Direction::Left);
                    } else if dx > threshold {
                        dirs.push(Direction::Right);
                    }
                    if dy < -threshold {
                        dirs.push(Direction::Up);
                    } else if dy > threshold {
                        dirs.push(Direction::Down);
                    }
                }

                dirs.into_iter()
                    .filter_map(|d| axis.get(d).map(str::to_string))
                    .collect()
            }
        }
    }
}
