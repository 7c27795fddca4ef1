//! Ray picking against registered scene shapes
//!
//! Each pickable shape is registered once with the entity that owns it, so
//! a hit maps straight to an entity id without walking a scene graph.

use std::collections::HashMap;

use glam::Vec3;

use super::{EntityId, SceneQuery};

/// Handle of a single pickable shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickHandle(pub u32);

/// A world-space ray with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; the direction is normalized (zero stays zero)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Pickable geometry, positioned at the handle's world position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickShape {
    Sphere { radius: f32 },
    /// Flat annulus in the XZ plane through the position
    Ring { inner: f32, outer: f32 },
}

impl PickShape {
    /// Nearest non-negative ray parameter at which the shape is hit
    pub fn intersect(&self, center: Vec3, ray: &Ray) -> Option<f32> {
        match *self {
            PickShape::Sphere { radius } => {
                let oc = ray.origin - center;
                let b = oc.dot(ray.direction);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let sqrt_disc = disc.sqrt();
                let near = -b - sqrt_disc;
                let far = -b + sqrt_disc;
                if near >= 0.0 {
                    Some(near)
                } else if far >= 0.0 {
                    // Origin inside the sphere
                    Some(far)
                } else {
                    None
                }
            }
            PickShape::Ring { inner, outer } => {
                let denom = ray.direction.y;
                if denom.abs() < 1e-6 {
                    return None;
                }
                let t = (center.y - ray.origin.y) / denom;
                if t < 0.0 {
                    return None;
                }
                let r = (ray.at(t) - center).length();
                (r >= inner && r <= outer).then_some(t)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Pickable {
    /// Owning entity; shapes without one never produce hover
    entity: Option<EntityId>,
    shape: PickShape,
    position: Vec3,
}

/// Nearest-hit result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub handle: PickHandle,
    pub entity: EntityId,
    pub distance: f32,
}

/// Registry of pickable shapes and entity positions
#[derive(Debug, Default)]
pub struct PickRegistry {
    pickables: HashMap<PickHandle, Pickable>,
    /// World positions by entity, used for look-at targeting
    entity_positions: HashMap<EntityId, Vec3>,
    next_handle: u32,
}

impl PickRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape owned by `entity` (or by nothing)
    pub fn register(
        &mut self,
        entity: Option<EntityId>,
        shape: PickShape,
        position: Vec3,
    ) -> PickHandle {
        let handle = PickHandle(self.next_handle);
        self.next_handle += 1;
        self.pickables.insert(handle, Pickable { entity, shape, position });
        if let Some(entity) = entity {
            self.entity_positions.entry(entity).or_insert(position);
        }
        handle
    }

    /// Move a shape. Returns false for unknown handles.
    pub fn set_shape_position(&mut self, handle: PickHandle, position: Vec3) -> bool {
        match self.pickables.get_mut(&handle) {
            Some(p) => {
                p.position = position;
                true
            }
            None => false,
        }
    }

    /// Record an entity's world position
    pub fn set_entity_position(&mut self, entity: EntityId, position: Vec3) {
        self.entity_positions.insert(entity, position);
    }

    pub fn remove(&mut self, handle: PickHandle) {
        self.pickables.remove(&handle);
    }

    pub fn len(&self) -> usize {
        self.pickables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickables.is_empty()
    }

    /// Nearest hit on a shape that belongs to an entity
    pub fn pick_nearest(&self, ray: &Ray) -> Option<PickHit> {
        self.pickables
            .iter()
            .filter_map(|(&handle, p)| {
                let entity = p.entity?;
                let distance = p.shape.intersect(p.position, ray)?;
                Some(PickHit { handle, entity, distance })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl SceneQuery for PickRegistry {
    fn pick(&self, ray: &Ray) -> Option<EntityId> {
        self.pick_nearest(ray).map(|hit| hit.entity)
    }

    fn world_position(&self, entity: EntityId) -> Option<Vec3> {
        self.entity_positions.get(&entity).copied()
    }
}
