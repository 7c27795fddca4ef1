//! Orbit camera rig
//!
//! Turns per-tick impulses into a damped spherical camera pose and resolves
//! hover and selection against a scene.

pub mod camera;
pub mod controller;
pub mod types;

pub use camera::{CameraPose, Projection};
pub use controller::{CameraRig, RigFrame};
pub use types::{RigEvent, RigState, RigTuning};
