//! Input aggregation
//!
//! Merges the latest gesture state with pointer drag and wheel deltas into
//! a single set of rig impulses per render tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::gesture::GestureState;

/// How gesture and pointer input combine within one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputPolicy {
    /// Sum gesture and pointer impulses
    Combine,
    /// Ignore pointer and wheel while a hand is driving the cursor
    #[default]
    PreferGesture,
}

/// Gains applied to each input path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTuning {
    #[serde(rename = "gestureRotateGain")]
    pub gesture_rotate_gain: f32,
    #[serde(rename = "gestureZoomGain")]
    pub gesture_zoom_gain: f32,
    /// Applied to viewport-normalized drag deltas
    #[serde(rename = "pointerGain")]
    pub pointer_gain: f32,
    /// Applied per 100 units of wheel delta
    #[serde(rename = "wheelGain")]
    pub wheel_gain: f32,
    #[serde(rename = "policy")]
    pub policy: InputPolicy,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            gesture_rotate_gain: 6.0,
            gesture_zoom_gain: 18.0,
            pointer_gain: 6.2,
            wheel_gain: 2.2,
            policy: InputPolicy::PreferGesture,
        }
    }
}

impl InputTuning {
    /// Replace non-finite gains with defaults
    pub fn validate(&mut self) {
        let defaults = Self::default();
        for (gain, default) in [
            (&mut self.gesture_rotate_gain, defaults.gesture_rotate_gain),
            (&mut self.gesture_zoom_gain, defaults.gesture_zoom_gain),
            (&mut self.pointer_gain, defaults.pointer_gain),
            (&mut self.wheel_gain, defaults.wheel_gain),
        ] {
            if !gain.is_finite() {
                *gain = default;
            }
        }
    }
}

/// Per-tick control input for the camera rig
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RigImpulse {
    pub theta: f32,
    pub phi: f32,
    pub radius: f32,
    /// Pick coordinate in NDC, absent when nothing points into the scene
    pub hover_ndc: Option<Vec2>,
    pub select_requested: bool,
}

/// Mirrored normalized cursor to NDC (x right, y up)
pub fn cursor_to_ndc(cursor: Vec2) -> Vec2 {
    let x = 1.0 - cursor.x;
    Vec2::new(x * 2.0 - 1.0, -(cursor.y * 2.0 - 1.0))
}

/// Collects pointer and wheel events between ticks
#[derive(Debug, Clone)]
pub struct InputAggregator {
    tuning: InputTuning,
    viewport: Vec2,
    pressed: bool,
    /// Last pointer position in pixels, tracked even while released
    last_pos: Option<Vec2>,
    /// Anchor of the current drag step; absent until a position is known
    drag_anchor: Option<Vec2>,
    pointer_theta: f32,
    pointer_phi: f32,
    wheel_radius: f32,
}

impl InputAggregator {
    pub fn new(tuning: InputTuning) -> Self {
        Self {
            tuning,
            viewport: Vec2::ONE,
            pressed: false,
            last_pos: None,
            drag_anchor: None,
            pointer_theta: 0.0,
            pointer_phi: 0.0,
            wheel_radius: 0.0,
        }
    }

    pub fn tuning(&self) -> &InputTuning {
        &self.tuning
    }

    pub fn set_policy(&mut self, policy: InputPolicy) {
        self.tuning.policy = policy;
    }

    /// Viewport size in pixels, used to normalize drag deltas
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width, height);
    }

    pub fn pointer_down(&mut self) {
        self.pressed = true;
        self.drag_anchor = self.last_pos;
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        if !position.is_finite() {
            return;
        }
        self.last_pos = Some(position);
        if !self.pressed {
            return;
        }
        if let Some(anchor) = self.drag_anchor {
            let size = self.viewport.max(Vec2::ONE);
            let delta = (position - anchor) / size;
            self.pointer_theta += delta.x * self.tuning.pointer_gain;
            self.pointer_phi += delta.y * self.tuning.pointer_gain;
        }
        self.drag_anchor = Some(position);
    }

    pub fn pointer_up(&mut self) {
        self.pressed = false;
        self.drag_anchor = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.pressed
    }

    /// Wheel delta in DOM convention: positive scrolls down and moves out
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y.is_finite() {
            self.wheel_radius += (delta_y / 100.0) * self.tuning.wheel_gain;
        }
    }

    /// Drain pointer/wheel accumulators and merge with the gesture state
    pub fn take_impulse(&mut self, gesture: Option<&GestureState>) -> RigImpulse {
        let mut impulse = RigImpulse::default();

        let gesture_active = match gesture {
            Some(state) => match (state.has_hands(), state.cursor) {
                (true, Some(cursor)) => {
                    impulse.hover_ndc = Some(cursor_to_ndc(cursor));
                    if state.rotate.is_active {
                        impulse.theta += state.rotate.dx * self.tuning.gesture_rotate_gain;
                        impulse.phi += state.rotate.dy * self.tuning.gesture_rotate_gain;
                    }
                    if state.zoom.is_active {
                        impulse.radius += state.zoom.delta * self.tuning.gesture_zoom_gain;
                    }
                    impulse.select_requested = state.pinch.just_pinched;
                    true
                }
                _ => false,
            },
            None => false,
        };

        let pointer = (
            std::mem::take(&mut self.pointer_theta),
            std::mem::take(&mut self.pointer_phi),
            std::mem::take(&mut self.wheel_radius),
        );
        let use_pointer = !(gesture_active && self.tuning.policy == InputPolicy::PreferGesture);
        if use_pointer {
            impulse.theta += pointer.0;
            impulse.phi += pointer.1;
            impulse.radius += pointer.2;
        }

        impulse
    }
}

impl Default for InputAggregator {
    fn default() -> Self {
        Self::new(InputTuning::default())
    }
}
