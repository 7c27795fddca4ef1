//! Frame-to-frame gesture tracking
//!
//! Owns the rolling state for one tracking session and applies the dropout
//! policy: a short run of empty frames keeps the smoothing history, a longer
//! one clears it so the next hand starts cold.

use super::estimator::GestureEstimator;
use super::types::{GestureRollingState, GestureState, GestureTuning};
use crate::hand::HandFrame;

/// Gesture estimator plus the rolling state of a single session
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    estimator: GestureEstimator,
    rolling: GestureRollingState,
    /// Consecutive frames without a usable hand
    empty_frames: u32,
}

impl GestureTracker {
    pub fn new(tuning: GestureTuning) -> Self {
        Self {
            estimator: GestureEstimator::new(tuning),
            rolling: GestureRollingState::default(),
            empty_frames: 0,
        }
    }

    /// Process one capture frame
    pub fn update(&mut self, hands: &[HandFrame], timestamp_ms: f64) -> GestureState {
        let (state, next) = self.estimator.estimate(hands, &self.rolling, timestamp_ms);

        if state.has_hands() {
            self.empty_frames = 0;
            self.rolling = next;
        } else {
            self.empty_frames = self.empty_frames.saturating_add(1);
            let limit = self.estimator.tuning().dropout_reset_frames.max(1);
            if self.empty_frames >= limit && !self.rolling.is_empty() {
                tracing::debug!(
                    empty_frames = self.empty_frames,
                    "Hands lost, clearing gesture history"
                );
                self.rolling.clear();
            }
        }

        state
    }

    /// Forget all history (tracking disabled or restarted)
    pub fn reset(&mut self) {
        self.rolling.clear();
        self.empty_frames = 0;
    }

    pub fn rolling_state(&self) -> &GestureRollingState {
        &self.rolling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::estimator::fixtures::{hand_at, open_hand};

    fn tracker_with_dropout(frames: u32) -> GestureTracker {
        GestureTracker::new(GestureTuning {
            dropout_reset_frames: frames,
            ..GestureTuning::default()
        })
    }

    #[test]
    fn test_short_dropout_keeps_history() {
        let mut tracker = tracker_with_dropout(3);
        tracker.update(&[hand_at((0.5, 0.5), 0.3)], 0.0);
        assert!(tracker.rolling_state().prev_pinch);

        tracker.update(&[], 1.0);
        tracker.update(&[], 2.0);
        assert!(tracker.rolling_state().prev_cursor.is_some());
        assert!(tracker.rolling_state().prev_pinch);

        // The hand comes back still pinched: no second select edge
        let state = tracker.update(&[hand_at((0.5, 0.5), 0.55)], 3.0);
        assert!(state.pinch.is_pinching);
        assert!(!state.pinch.just_pinched);
    }

    #[test]
    fn test_long_dropout_clears_history() {
        let mut tracker = tracker_with_dropout(3);
        tracker.update(&[open_hand((0.5, 0.5))], 0.0);
        for i in 0..3 {
            let state = tracker.update(&[], i as f64);
            assert_eq!(state.cursor, None);
        }
        assert!(tracker.rolling_state().is_empty());

        // Next sample is unsmoothed and produces no rotate jump
        let state = tracker.update(&[open_hand((0.9, 0.1))], 10.0);
        assert_eq!(state.cursor, Some(glam::Vec2::new(0.9, 0.1)));
        assert!(!state.rotate.is_active);
    }

    #[test]
    fn test_zero_dropout_clears_immediately() {
        let mut tracker = tracker_with_dropout(0);
        tracker.update(&[open_hand((0.5, 0.5))], 0.0);
        tracker.update(&[], 1.0);
        assert!(tracker.rolling_state().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut tracker = GestureTracker::default();
        tracker.update(&[hand_at((0.5, 0.5), 0.1)], 0.0);
        tracker.reset();
        assert!(tracker.rolling_state().is_empty());
        let state = tracker.update(&[hand_at((0.5, 0.5), 0.1)], 1.0);
        assert!(state.pinch.just_pinched);
    }
}
