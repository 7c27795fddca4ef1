//! Rig state and tuning

use serde::{Deserialize, Serialize};

use crate::scene::EntityId;

/// Spherical camera coordinates and their velocities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigState {
    /// Azimuth in radians, wrapped to [0, 2π)
    pub theta: f32,
    /// Polar angle in radians, measured from +Y
    pub phi: f32,
    /// Distance from the look-at target
    pub radius: f32,
    pub vel_theta: f32,
    pub vel_phi: f32,
    pub vel_radius: f32,
}

/// Edge-triggered notifications raised by a rig tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigEvent {
    HoverChanged(Option<EntityId>),
    SelectionChanged(EntityId),
}

/// Orbit rig tuning (serialized in the settings file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigTuning {
    #[serde(rename = "initialTheta")]
    pub initial_theta: f32,
    #[serde(rename = "initialPhi")]
    pub initial_phi: f32,
    #[serde(rename = "initialRadius")]
    pub initial_radius: f32,
    /// Fraction of velocity left after one second
    #[serde(rename = "dampingPerSecond")]
    pub damping_per_second: f32,
    /// Distance kept from each pole, in radians
    #[serde(rename = "poleMargin")]
    pub pole_margin: f32,
    #[serde(rename = "minRadius")]
    pub min_radius: f32,
    #[serde(rename = "maxRadius")]
    pub max_radius: f32,
    #[serde(rename = "maxAngularVelocity")]
    pub max_angular_velocity: f32,
    #[serde(rename = "maxRadialVelocity")]
    pub max_radial_velocity: f32,
    /// Longest elapsed time integrated in a single tick, in seconds
    #[serde(rename = "maxDt")]
    pub max_dt: f32,
    /// Vertical field of view in degrees
    #[serde(rename = "fovDegrees")]
    pub fov_degrees: f32,
    #[serde(rename = "near")]
    pub near: f32,
    #[serde(rename = "far")]
    pub far: f32,
}

impl Default for RigTuning {
    fn default() -> Self {
        Self {
            initial_theta: 0.8,
            initial_phi: 1.12,
            initial_radius: 36.0,
            damping_per_second: 0.001,
            pole_margin: 0.34,
            min_radius: 10.0,
            max_radius: 75.0,
            max_angular_velocity: 40.0,
            max_radial_velocity: 400.0,
            max_dt: 0.25,
            fov_degrees: 50.0,
            near: 0.1,
            far: 300.0,
        }
    }
}

impl RigTuning {
    /// Repair ranges that would make clamping or projection ill-defined
    pub fn validate(&mut self) {
        let defaults = Self::default();
        if !(self.pole_margin > 0.0 && self.pole_margin < std::f32::consts::FRAC_PI_2) {
            self.pole_margin = defaults.pole_margin;
        }
        if !(self.min_radius.is_finite() && self.min_radius > 0.0) {
            self.min_radius = defaults.min_radius;
        }
        if !self.max_radius.is_finite() || self.max_radius <= self.min_radius {
            tracing::warn!(
                min = self.min_radius,
                max = self.max_radius,
                "Rig radius range is empty, using defaults"
            );
            self.min_radius = defaults.min_radius;
            self.max_radius = defaults.max_radius;
        }
        if !(self.damping_per_second > 0.0 && self.damping_per_second <= 1.0) {
            self.damping_per_second = defaults.damping_per_second;
        }
        if !(self.max_angular_velocity.is_finite() && self.max_angular_velocity > 0.0) {
            self.max_angular_velocity = defaults.max_angular_velocity;
        }
        if !(self.max_radial_velocity.is_finite() && self.max_radial_velocity > 0.0) {
            self.max_radial_velocity = defaults.max_radial_velocity;
        }
        if !(self.max_dt.is_finite() && self.max_dt > 0.0) {
            self.max_dt = defaults.max_dt;
        }
        if !(self.fov_degrees > 1.0 && self.fov_degrees < 179.0) {
            self.fov_degrees = defaults.fov_degrees;
        }
        if !(self.near > 0.0 && self.far > self.near) {
            self.near = defaults.near;
            self.far = defaults.far;
        }
        for (value, default) in [
            (&mut self.initial_theta, defaults.initial_theta),
            (&mut self.initial_phi, defaults.initial_phi),
            (&mut self.initial_radius, defaults.initial_radius),
        ] {
            if !value.is_finite() {
                *value = default;
            }
        }
    }

    pub fn phi_range(&self) -> (f32, f32) {
        (self.pole_margin, std::f32::consts::PI - self.pole_margin)
    }

    pub fn initial_state(&self) -> RigState {
        let (phi_min, phi_max) = self.phi_range();
        RigState {
            theta: self.initial_theta.rem_euclid(std::f32::consts::TAU),
            phi: self.initial_phi.clamp(phi_min, phi_max),
            radius: self.initial_radius.clamp(self.min_radius, self.max_radius),
            vel_theta: 0.0,
            vel_phi: 0.0,
            vel_radius: 0.0,
        }
    }
}
