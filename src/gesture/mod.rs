//! Hand gesture recognition
//!
//! Converts per-frame hand landmarks into a debounced, smoothed gesture
//! reading: a fingertip cursor, pinch-to-select, open-hand rotate, and
//! two-hand zoom.

pub mod estimator;
pub mod tracker;
pub mod types;

pub use estimator::GestureEstimator;
pub use tracker::GestureTracker;
pub use types::{
    GestureDebug, GestureRollingState, GestureState, GestureTuning, PinchState, RotateState,
    ZoomState,
};
