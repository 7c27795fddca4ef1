//! Damped orbit rig
//!
//! Integrates per-tick impulses into spherical camera coordinates with
//! exponential damping that depends on elapsed time only, hit-tests the
//! hover cursor against the scene, and tracks selection.

use std::f32::consts::TAU;

use glam::Vec3;

use super::camera::{CameraPose, Projection};
use super::types::{RigEvent, RigState, RigTuning};
use crate::input::RigImpulse;
use crate::scene::{EntityId, SceneQuery};

/// Result of one rig tick
#[derive(Debug, Clone, PartialEq)]
pub struct RigFrame {
    pub pose: CameraPose,
    pub hovered: Option<EntityId>,
    pub selected: Option<EntityId>,
    /// Hover/selection changes raised during this tick
    pub events: Vec<RigEvent>,
}

/// Orbit camera controller
pub struct CameraRig {
    tuning: RigTuning,
    state: RigState,
    projection: Projection,
    /// Pose produced by the previous tick, used for this tick's hit-test
    pose: CameraPose,
    hovered: Option<EntityId>,
    selected: Option<EntityId>,
}

impl CameraRig {
    pub fn new(mut tuning: RigTuning) -> Self {
        tuning.validate();
        let state = tuning.initial_state();
        let projection = Projection::new(tuning.fov_degrees, 16.0 / 9.0, tuning.near, tuning.far);
        let pose = CameraPose::orbit(Vec3::ZERO, state.theta, state.phi, state.radius, projection);
        Self {
            tuning,
            state,
            projection,
            pose,
            hovered: None,
            selected: None,
        }
    }

    /// Advance the rig by `dt` seconds
    pub fn tick(&mut self, impulse: &RigImpulse, dt: f32, scene: &dyn SceneQuery) -> RigFrame {
        let mut events = Vec::new();

        // 1. Hover, against the pose the user is currently looking at
        let hovered = impulse
            .hover_ndc
            .and_then(|ndc| scene.pick(&self.pose.ray_from_ndc(ndc)));
        if hovered != self.hovered {
            tracing::debug!(?hovered, "Hover changed");
            self.hovered = hovered;
            events.push(RigEvent::HoverChanged(hovered));
        }

        // 2. Selection: a select with nothing under the cursor keeps the current one
        if impulse.select_requested {
            if let Some(id) = self.hovered {
                if self.selected != Some(id) {
                    tracing::info!(entity = id.0, "Selection changed");
                    self.selected = Some(id);
                    events.push(RigEvent::SelectionChanged(id));
                }
            }
        }

        // 3-4. Integrate, damp, clamp
        self.integrate(impulse, dt);

        // 5. Pose around the selected entity, or the origin
        let target = self
            .selected
            .and_then(|id| scene.world_position(id))
            .filter(|p| p.is_finite())
            .unwrap_or(Vec3::ZERO);
        self.pose = CameraPose::orbit(
            target,
            self.state.theta,
            self.state.phi,
            self.state.radius,
            self.projection,
        );

        RigFrame {
            pose: self.pose,
            hovered: self.hovered,
            selected: self.selected,
            events,
        }
    }

    fn integrate(&mut self, impulse: &RigImpulse, dt: f32) {
        let t = &self.tuning;
        let dt = if dt.is_finite() { dt.clamp(0.0, t.max_dt) } else { 0.0 };
        let s = &mut self.state;

        s.vel_theta = accumulate(s.vel_theta, impulse.theta, t.max_angular_velocity);
        s.vel_phi = accumulate(s.vel_phi, impulse.phi, t.max_angular_velocity);
        s.vel_radius = accumulate(s.vel_radius, impulse.radius, t.max_radial_velocity);

        s.theta = wrap_angle(s.theta + s.vel_theta * dt);
        s.phi += s.vel_phi * dt;
        s.radius += s.vel_radius * dt;

        // Same decay whether dt arrives as one long tick or many short ones
        let decay = t.damping_per_second.powf(dt);
        s.vel_theta *= decay;
        s.vel_phi *= decay;
        s.vel_radius *= decay;

        let (phi_min, phi_max) = t.phi_range();
        s.phi = s.phi.clamp(phi_min, phi_max);
        s.radius = s.radius.clamp(t.min_radius, t.max_radius);
    }

    pub fn state(&self) -> &RigState {
        &self.state
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn hovered(&self) -> Option<EntityId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Select from outside the rig (e.g. a list click). Returns the event
    /// when the selection actually changed.
    pub fn set_selected(&mut self, selected: Option<EntityId>) -> Option<RigEvent> {
        if self.selected == selected {
            return None;
        }
        self.selected = selected;
        selected.map(RigEvent::SelectionChanged)
    }

    /// Update aspect ratio on resize
    pub fn set_aspect(&mut self, aspect: f32) {
        self.projection.set_aspect(aspect);
        self.pose.projection = self.projection;
    }

    /// Return to the configured initial orbit, keeping the selection
    pub fn reset(&mut self) {
        self.state = self.tuning.initial_state();
    }

    pub fn tuning(&self) -> &RigTuning {
        &self.tuning
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(RigTuning::default())
    }
}

/// Wrap into [0, 2π); rem_euclid can round up to exactly 2π for tiny negatives
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Add an impulse to a velocity, dropping non-finite input and bounding the result
fn accumulate(velocity: f32, impulse: f32, limit: f32) -> f32 {
    let impulse = if impulse.is_finite() { impulse } else { 0.0 };
    (velocity + impulse).clamp(-limit, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PickRegistry, PickShape};
    use glam::Vec2;

    const DT: f32 = 0.016;

    fn empty_scene() -> PickRegistry {
        PickRegistry::new()
    }

    fn theta_impulse(theta: f32) -> RigImpulse {
        RigImpulse {
            theta,
            ..RigImpulse::default()
        }
    }

    #[test]
    fn test_pointer_drag_decays_monotonically() {
        let scene = empty_scene();
        let mut rig = CameraRig::default();
        // A (+0.1, 0) viewport drag at the default pointer gain
        rig.tick(&theta_impulse(0.1 * 6.2), DT, &scene);
        let mut prev = rig.state().vel_theta;
        assert!(prev > 0.0);

        for _ in 0..300 {
            rig.tick(&RigImpulse::default(), DT, &scene);
            let v = rig.state().vel_theta;
            assert!(v >= 0.0);
            assert!(v < prev);
            prev = v;
        }
        assert!(prev < 1e-6);
    }

    #[test]
    fn test_damping_is_frame_rate_independent() {
        let scene = empty_scene();
        let total = 0.2;
        let mut coarse = CameraRig::default();
        coarse.tick(&theta_impulse(3.0), total, &scene);

        for n in [2, 5, 20, 50] {
            let mut fine = CameraRig::default();
            let dt = total / n as f32;
            fine.tick(&theta_impulse(3.0), dt, &scene);
            for _ in 1..n {
                fine.tick(&RigImpulse::default(), dt, &scene);
            }
            let a = coarse.state().vel_theta;
            let b = fine.state().vel_theta;
            assert!((a - b).abs() < 1e-4 * a.abs().max(1.0), "n={} a={} b={}", n, a, b);
        }
    }

    #[test]
    fn test_bounds_hold_under_adversarial_impulses() {
        let scene = empty_scene();
        let mut rig = CameraRig::default();
        let tuning = rig.tuning().clone();
        let (phi_min, phi_max) = tuning.phi_range();
        let extremes = [
            f32::MAX,
            f32::MIN,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            1e9,
            -1e9,
            0.0,
        ];
        let dts = [DT, 0.0, 10.0, -1.0, f32::NAN, f32::INFINITY];
        for (i, &a) in extremes.iter().enumerate() {
            for (j, &dt) in dts.iter().enumerate() {
                let b = extremes[(i + j + 3) % extremes.len()];
                let impulse = RigImpulse {
                    theta: a,
                    phi: b,
                    radius: a,
                    ..RigImpulse::default()
                };
                let frame = rig.tick(&impulse, dt, &scene);
                let s = rig.state();
                assert!(s.phi >= phi_min && s.phi <= phi_max, "phi={}", s.phi);
                assert!(s.radius >= tuning.min_radius && s.radius <= tuning.max_radius);
                assert!(s.theta.is_finite() && s.theta >= 0.0 && s.theta < TAU);
                assert!(
                    s.vel_theta.is_finite() && s.vel_phi.is_finite() && s.vel_radius.is_finite()
                );
                assert!(frame.pose.eye.is_finite());
            }
        }
    }

    #[test]
    fn test_hover_edges_and_selection() {
        let mut scene = PickRegistry::new();
        let body = EntityId(4);
        scene.register(Some(body), PickShape::Sphere { radius: 3.0 }, Vec3::ZERO);
        let mut rig = CameraRig::default();

        // Centre of the screen looks at the origin
        let hover = RigImpulse {
            hover_ndc: Some(Vec2::ZERO),
            ..RigImpulse::default()
        };
        let frame = rig.tick(&hover, DT, &scene);
        assert_eq!(frame.hovered, Some(body));
        assert_eq!(frame.events, vec![RigEvent::HoverChanged(Some(body))]);

        // Holding hover raises nothing new
        let frame = rig.tick(&hover, DT, &scene);
        assert!(frame.events.is_empty());

        let select = RigImpulse {
            select_requested: true,
            ..hover
        };
        let frame = rig.tick(&select, DT, &scene);
        assert_eq!(frame.selected, Some(body));
        assert_eq!(frame.events, vec![RigEvent::SelectionChanged(body)]);

        // Re-selecting the same entity is not an edge
        let frame = rig.tick(&select, DT, &scene);
        assert!(frame.events.is_empty());

        // Cursor gone: hover clears, selection stays
        let frame = rig.tick(&RigImpulse::default(), DT, &scene);
        assert_eq!(frame.hovered, None);
        assert_eq!(frame.selected, Some(body));
        assert_eq!(frame.events, vec![RigEvent::HoverChanged(None)]);
    }

    #[test]
    fn test_select_without_hover_is_noop() {
        let scene = empty_scene();
        let mut rig = CameraRig::default();
        let frame = rig.tick(
            &RigImpulse {
                select_requested: true,
                hover_ndc: Some(Vec2::ZERO),
                ..RigImpulse::default()
            },
            DT,
            &scene,
        );
        assert_eq!(frame.selected, None);
        assert!(frame.events.is_empty());
    }

    #[test]
    fn test_pose_follows_selection() {
        let mut scene = PickRegistry::new();
        let body = EntityId(1);
        let target = Vec3::new(12.0, 0.5, -3.0);
        scene.register(Some(body), PickShape::Sphere { radius: 1.0 }, target);

        let mut rig = CameraRig::default();
        rig.set_selected(Some(body));
        let frame = rig.tick(&RigImpulse::default(), DT, &scene);
        assert_eq!(frame.pose.target, target);
        assert!((frame.pose.eye.distance(target) - rig.state().radius).abs() < 1e-3);

        // Unknown entities fall back to the origin
        rig.set_selected(Some(EntityId(99)));
        let frame = rig.tick(&RigImpulse::default(), DT, &scene);
        assert_eq!(frame.pose.target, Vec3::ZERO);
    }

    #[test]
    fn test_set_selected_reports_changes() {
        let mut rig = CameraRig::default();
        assert_eq!(
            rig.set_selected(Some(EntityId(2))),
            Some(RigEvent::SelectionChanged(EntityId(2)))
        );
        assert_eq!(rig.set_selected(Some(EntityId(2))), None);
        assert_eq!(rig.set_selected(None), None);
        assert_eq!(rig.selected(), None);
    }

    #[test]
    fn test_reset_restores_initial_orbit() {
        let scene = empty_scene();
        let mut rig = CameraRig::default();
        rig.tick(&theta_impulse(5.0), 0.1, &scene);
        rig.reset();
        assert_eq!(*rig.state(), rig.tuning().initial_state());
    }
}
