//! Demo solar scene
//!
//! A central body with eight orbiting bodies. Sizes and speeds are visual,
//! not physical.

use glam::Vec3;

use super::pick::{PickHandle, PickRegistry, PickShape, Ray};
use super::{EntityId, SceneQuery};

/// Vertical wobble of each orbit, as a fraction of the orbit radius
const ORBIT_TILT: f32 = 0.08;
/// Half-width of the pickable band around each orbit path
const ORBIT_RING_HALF_WIDTH: f32 = 0.01;

/// Static description of one body
#[derive(Debug, Clone, Copy)]
pub struct BodySpec {
    pub name: &'static str,
    pub radius: f32,
    pub orbit_radius: f32,
    /// Radians per second
    pub orbit_speed: f32,
    /// Inner and outer ring radii as multiples of the body radius
    pub ring_scale: Option<(f32, f32)>,
}

#[rustfmt::skip]
pub const BODIES: &[BodySpec] = &[
    BodySpec { name: "sun", radius: 2.15, orbit_radius: 0.0, orbit_speed: 0.0, ring_scale: None },
    BodySpec { name: "mercury", radius: 0.24, orbit_radius: 4.2, orbit_speed: 0.85, ring_scale: None },
    BodySpec { name: "venus", radius: 0.61, orbit_radius: 6.2, orbit_speed: 0.62, ring_scale: None },
    BodySpec { name: "earth", radius: 0.64, orbit_radius: 8.4, orbit_speed: 0.52, ring_scale: None },
    BodySpec { name: "mars", radius: 0.34, orbit_radius: 10.8, orbit_speed: 0.42, ring_scale: None },
    BodySpec { name: "jupiter", radius: 1.35, orbit_radius: 15.8, orbit_speed: 0.24, ring_scale: None },
    BodySpec { name: "saturn", radius: 1.15, orbit_radius: 20.9, orbit_speed: 0.18, ring_scale: Some((1.35, 2.25)) },
    BodySpec { name: "uranus", radius: 0.95, orbit_radius: 26.2, orbit_speed: 0.12, ring_scale: None },
    BodySpec { name: "neptune", radius: 0.93, orbit_radius: 31.0, orbit_speed: 0.095, ring_scale: None },
];

struct Body {
    entity: EntityId,
    spec: BodySpec,
    /// Body sphere plus its rings, if any
    handles: Vec<PickHandle>,
}

/// Orbiting bodies registered for picking
pub struct SolarScene {
    bodies: Vec<Body>,
    registry: PickRegistry,
}

impl SolarScene {
    pub fn new() -> Self {
        let mut registry = PickRegistry::new();
        let mut bodies = Vec::with_capacity(BODIES.len());

        for (i, spec) in BODIES.iter().enumerate() {
            let entity = EntityId(i as u32);
            let position = Self::orbit_position(spec, 0.0);
            let mut handles = vec![registry.register(
                Some(entity),
                PickShape::Sphere { radius: spec.radius },
                position,
            )];
            if let Some((inner, outer)) = spec.ring_scale {
                handles.push(registry.register(
                    Some(entity),
                    PickShape::Ring {
                        inner: spec.radius * inner,
                        outer: spec.radius * outer,
                    },
                    position,
                ));
            }
            if spec.orbit_radius > 0.0 {
                // Orbit paths render but belong to no body
                registry.register(
                    None,
                    PickShape::Ring {
                        inner: spec.orbit_radius - ORBIT_RING_HALF_WIDTH,
                        outer: spec.orbit_radius + ORBIT_RING_HALF_WIDTH,
                    },
                    Vec3::ZERO,
                );
            }
            bodies.push(Body { entity, spec: *spec, handles });
        }

        tracing::debug!(bodies = bodies.len(), pickables = registry.len(), "Solar scene built");
        Self { bodies, registry }
    }

    /// Position of a body at `elapsed` seconds
    pub fn orbit_position(spec: &BodySpec, elapsed: f32) -> Vec3 {
        if spec.orbit_radius == 0.0 {
            return Vec3::ZERO;
        }
        let a = elapsed * spec.orbit_speed;
        let r = spec.orbit_radius;
        Vec3::new(a.cos() * r, (a * 0.7).sin() * r * ORBIT_TILT, a.sin() * r)
    }

    /// Advance every body to `elapsed` seconds since start
    pub fn update(&mut self, elapsed: f32) {
        for body in &self.bodies {
            let position = Self::orbit_position(&body.spec, elapsed);
            for &handle in &body.handles {
                self.registry.set_shape_position(handle, position);
            }
            self.registry.set_entity_position(body.entity, position);
        }
    }

    /// Look up a body by name
    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.bodies
            .iter()
            .find(|b| b.spec.name.eq_ignore_ascii_case(name))
            .map(|b| b.entity)
    }

    pub fn name_of(&self, entity: EntityId) -> Option<&'static str> {
        self.bodies
            .iter()
            .find(|b| b.entity == entity)
            .map(|b| b.spec.name)
    }

    pub fn registry(&self) -> &PickRegistry {
        &self.registry
    }
}

impl Default for SolarScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneQuery for SolarScene {
    fn pick(&self, ray: &Ray) -> Option<EntityId> {
        self.registry.pick(ray)
    }

    fn world_position(&self, entity: EntityId) -> Option<Vec3> {
        self.registry.world_position(entity)
    }
}
