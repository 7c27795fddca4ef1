//! Orbit camera pose and projection
//!
//! Spherical-coordinate camera that looks at a target point, plus the
//! inverse mapping from normalized device coordinates to world rays.

use glam::{Mat4, Vec2, Vec3};

use crate::scene::Ray;

/// Perspective projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Aspect ratio (width/height)
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: fov_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Update aspect ratio on resize; degenerate sizes are ignored
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(50.0, 16.0 / 9.0, 0.1, 300.0)
    }
}

/// Camera placement for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
}

impl CameraPose {
    /// Place the camera on a sphere around `target`.
    ///
    /// `phi` is measured from +Y, `theta` around +Y starting at +X.
    pub fn orbit(target: Vec3, theta: f32, phi: f32, radius: f32, projection: Projection) -> Self {
        let offset = Vec3::new(
            radius * phi.sin() * theta.cos(),
            radius * phi.cos(),
            radius * phi.sin() * theta.sin(),
        );
        Self {
            eye: target + offset,
            target,
            up: Vec3::Y,
            projection,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World ray through a point in normalized device coordinates
    /// (x right, y up, both -1..1)
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inv = self.view_projection_matrix().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        Ray::new(self.eye, far - near)
    }
}
