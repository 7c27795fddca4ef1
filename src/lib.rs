//! Gesture Orbit - hand-gesture and pointer driven orbital camera
//!
//! Webcam or recorded hand landmarks are turned into pinch, rotate and zoom
//! gestures, merged with mouse input, and fed to a damped spherical camera
//! rig that hover-picks and selects bodies in a small solar scene.

pub mod app;
#[cfg(feature = "webcam")]
pub mod camera;
pub mod gesture;
pub mod hand;
pub mod input;
#[cfg(feature = "webcam")]
pub mod ml;
pub mod rig;
pub mod scene;
pub mod settings;
pub mod telemetry;
pub mod tracking;

pub use app::App;
