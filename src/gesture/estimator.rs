//! Gesture estimation from raw hand landmarks
//!
//! Turns one frame of landmarks into a pinch / rotate / zoom reading. The
//! estimator is pure: everything it remembers between frames lives in the
//! [`GestureRollingState`] passed in and handed back.

use glam::Vec2;

use super::types::{
    GestureDebug, GestureRollingState, GestureState, GestureTuning, PinchState, RotateState,
    ZoomState,
};
use crate::hand::{HandFrame, MAX_HANDS};

/// Stateless gesture estimator
#[derive(Debug, Clone, Default)]
pub struct GestureEstimator {
    tuning: GestureTuning,
}

impl GestureEstimator {
    pub fn new(tuning: GestureTuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &GestureTuning {
        &self.tuning
    }

    /// Estimate the gesture state for one capture frame.
    ///
    /// The first usable hand is the control hand (cursor and pinch); the
    /// second, if present, only contributes to zoom. With no usable hands the
    /// canonical empty state is returned along with `prev` unchanged.
    pub fn estimate(
        &self,
        hands: &[HandFrame],
        prev: &GestureRollingState,
        timestamp_ms: f64,
    ) -> (GestureState, GestureRollingState) {
        let usable: Vec<&HandFrame> = hands
            .iter()
            .filter(|h| h.is_usable())
            .take(MAX_HANDS)
            .collect();

        let Some(primary) = usable.first() else {
            return (GestureState::empty(timestamp_ms), *prev);
        };
        let t = &self.tuning;

        // Normalize by approximate hand size so the thresholds hold at any
        // distance from the camera
        let scale = primary.wrist().distance(&primary.index_base()).max(t.scale_epsilon);
        let pinch_dist_norm = primary.thumb_tip().distance(&primary.index_tip()) / scale;

        let was_pinching = prev.prev_pinch;
        let is_pinching = if was_pinching {
            pinch_dist_norm < t.pinch_release
        } else {
            pinch_dist_norm < t.pinch_engage
        };
        let strength =
            (1.0 - (pinch_dist_norm - t.strength_near) / t.strength_span).clamp(0.0, 1.0);

        let tip = primary.index_tip();
        let raw_cursor = Vec2::new(tip.x, tip.y);
        let cursor = match prev.prev_cursor {
            Some(p) => p + (raw_cursor - p) * t.cursor_alpha,
            None => raw_cursor,
        };

        let rotate = match prev.prev_cursor {
            Some(p) if !is_pinching => RotateState {
                dx: cursor.x - p.x,
                dy: cursor.y - p.y,
                is_active: true,
            },
            _ => RotateState::default(),
        };

        let mut zoom = ZoomState::default();
        let mut two_hand_dist = None;
        if let [first, second] = usable.as_slice() {
            let d = first.index_tip().distance(&second.index_tip());
            two_hand_dist = Some(d);
            if let Some(prev_d) = prev.prev_two_hand_dist {
                // > 0 when the hands moved apart; apart maps to a negative
                // radial delta so the camera moves in
                let delta = d - prev_d;
                zoom = ZoomState {
                    delta: -delta * t.zoom_gain,
                    is_active: delta.abs() > t.zoom_noise_floor,
                };
            }
        }

        let state = GestureState {
            hands_count: usable.len() as u8,
            cursor: Some(cursor),
            pinch: PinchState {
                is_pinching,
                just_pinched: is_pinching && !was_pinching,
                strength,
            },
            rotate,
            zoom,
            timestamp_ms,
            debug: t.include_debug.then_some(GestureDebug {
                pinch_dist_norm: Some(pinch_dist_norm),
                two_hand_dist,
            }),
        };

        let next = GestureRollingState {
            prev_cursor: Some(cursor),
            prev_pinch: is_pinching,
            prev_two_hand_dist: two_hand_dist,
        };

        (state, next)
    }
}

/// Hand fixtures shared by the gesture and app tests
#[cfg(test)]
pub(crate) mod fixtures {
    use crate::hand::{HandFrame, Landmark, INDEX_BASE, INDEX_TIP, THUMB_TIP, WRIST};

    /// Hand with a 0.1 wrist-to-index-base scale, index tip at `tip`, and the
    /// thumb placed so the normalized pinch distance equals `pinch_norm`
    pub fn hand_at(tip: (f32, f32), pinch_norm: f32) -> HandFrame {
        let mut hand = HandFrame::default();
        hand.landmarks[WRIST] = Landmark::new(0.5, 0.9);
        hand.landmarks[INDEX_BASE] = Landmark::new(0.5, 0.8);
        hand.landmarks[INDEX_TIP] = Landmark::new(tip.0, tip.1);
        hand.landmarks[THUMB_TIP] = Landmark::new(tip.0 - pinch_norm * 0.1, tip.1);
        hand
    }

    pub fn open_hand(tip: (f32, f32)) -> HandFrame {
        hand_at(tip, 1.0)
    }
}
