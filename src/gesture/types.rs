//! Gesture state and tuning types

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pinch (thumb + index) descriptor
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PinchState {
    pub is_pinching: bool,
    /// True only on the tick the pinch engaged
    pub just_pinched: bool,
    /// 0..1, closer fingertips give higher strength
    pub strength: f32,
}

/// Open-hand drag descriptor, cursor delta in normalized frame units
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RotateState {
    pub dx: f32,
    pub dy: f32,
    pub is_active: bool,
}

/// Two-hand zoom descriptor
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    /// Negative when the hands move apart, positive when they move together
    pub delta: f32,
    pub is_active: bool,
}

/// Raw distances useful when tuning thresholds
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureDebug {
    pub pinch_dist_norm: Option<f32>,
    pub two_hand_dist: Option<f32>,
}

/// Output of one gesture estimation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    /// 0, 1 or 2
    pub hands_count: u8,
    /// Smoothed index fingertip, present iff `hands_count >= 1`
    pub cursor: Option<Vec2>,
    pub pinch: PinchState,
    pub rotate: RotateState,
    pub zoom: ZoomState,
    pub timestamp_ms: f64,
    pub debug: Option<GestureDebug>,
}

impl GestureState {
    /// Canonical state for a frame with no hands
    pub fn empty(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }

    pub fn has_hands(&self) -> bool {
        self.hands_count > 0
    }

    /// Fold an earlier state that nobody consumed into this one.
    ///
    /// Rotate and zoom deltas add up while the same gesture continues, and a
    /// pinch edge carries over as long as the pinch is still held.
    pub fn absorb(&mut self, older: &GestureState) {
        if older.pinch.just_pinched && self.pinch.is_pinching {
            self.pinch.just_pinched = true;
        }
        if self.rotate.is_active && older.rotate.is_active {
            self.rotate.dx += older.rotate.dx;
            self.rotate.dy += older.rotate.dy;
        }
        if self.hands_count == 2 && older.zoom.is_active {
            self.zoom.delta += older.zoom.delta;
            self.zoom.is_active = true;
        }
    }

    /// The same hands with nothing new to apply: cursor and pinch hold are
    /// kept, motion and the pinch edge are cleared
    pub fn held(&self) -> Self {
        Self {
            pinch: PinchState {
                just_pinched: false,
                ..self.pinch
            },
            rotate: RotateState::default(),
            zoom: ZoomState::default(),
            ..*self
        }
    }

    /// Cursor position for an on-screen indicator.
    ///
    /// The capture feed is shown mirrored, so overlays normally pass
    /// `mirror_x = true`. The result is clamped to the unit square.
    pub fn display_cursor(&self, mirror_x: bool) -> Option<Vec2> {
        if !self.has_hands() {
            return None;
        }
        self.cursor.map(|c| {
            let x = if mirror_x { 1.0 - c.x } else { c.x };
            Vec2::new(x.clamp(0.0, 1.0), c.y.clamp(0.0, 1.0))
        })
    }
}

/// State carried from one estimation to the next
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureRollingState {
    pub prev_cursor: Option<Vec2>,
    pub prev_pinch: bool,
    pub prev_two_hand_dist: Option<f32>,
}

impl GestureRollingState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Gesture estimator tuning (values tuned for webcam variability)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTuning {
    /// Normalized pinch distance below which a pinch engages
    #[serde(rename = "pinchEngage")]
    pub pinch_engage: f32,
    /// Normalized pinch distance at or above which a pinch releases
    #[serde(rename = "pinchRelease")]
    pub pinch_release: f32,
    /// Normalized distance mapped to full pinch strength
    #[serde(rename = "strengthNear")]
    pub strength_near: f32,
    /// Distance span over which strength falls from 1 to 0
    #[serde(rename = "strengthSpan")]
    pub strength_span: f32,
    /// Cursor smoothing blend factor (lower = smoother)
    #[serde(rename = "cursorAlpha")]
    pub cursor_alpha: f32,
    /// Gain applied to the two-hand distance change
    #[serde(rename = "zoomGain")]
    pub zoom_gain: f32,
    /// Two-hand distance change below which zoom stays inactive
    #[serde(rename = "zoomNoiseFloor")]
    pub zoom_noise_floor: f32,
    /// Floor for the hand-size normalization scale
    #[serde(rename = "scaleEpsilon")]
    pub scale_epsilon: f32,
    /// Consecutive empty frames before rolling state is cleared (0 = immediately)
    #[serde(rename = "dropoutResetFrames")]
    pub dropout_reset_frames: u32,
    /// Attach raw distances to every emitted state
    #[serde(rename = "includeDebug")]
    pub include_debug: bool,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self {
            pinch_engage: 0.50,
            pinch_release: 0.62,
            strength_near: 0.35,
            strength_span: 0.45,
            cursor_alpha: 0.28,
            zoom_gain: 6.5,
            zoom_noise_floor: 0.002,
            scale_epsilon: 1e-6,
            dropout_reset_frames: 3,
            include_debug: true,
        }
    }
}

impl GestureTuning {
    /// Repair values that would break the estimator's invariants
    pub fn validate(&mut self) {
        let defaults = Self::default();
        if !(self.pinch_engage.is_finite() && self.pinch_engage > 0.0) {
            self.pinch_engage = defaults.pinch_engage;
        }
        if !self.pinch_release.is_finite() || self.pinch_release <= self.pinch_engage {
            tracing::warn!(
                engage = self.pinch_engage,
                release = self.pinch_release,
                "Pinch release threshold must exceed engage threshold, widening band"
            );
            self.pinch_release =
                self.pinch_engage * (defaults.pinch_release / defaults.pinch_engage);
        }
        if !(self.cursor_alpha > 0.0 && self.cursor_alpha <= 1.0) {
            self.cursor_alpha = defaults.cursor_alpha;
        }
        if !(self.strength_span.is_finite() && self.strength_span > 0.0) {
            self.strength_span = defaults.strength_span;
        }
        if !(self.scale_epsilon.is_finite() && self.scale_epsilon > 0.0) {
            self.scale_epsilon = defaults.scale_epsilon;
        }
        if !self.zoom_noise_floor.is_finite() || self.zoom_noise_floor < 0.0 {
            self.zoom_noise_floor = defaults.zoom_noise_floor;
        }
        if !self.zoom_gain.is_finite() {
            self.zoom_gain = defaults.zoom_gain;
        }
        if !self.strength_near.is_finite() {
            self.strength_near = defaults.strength_near;
        }
    }
}
