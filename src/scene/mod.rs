//! Scene collaborator interface
//!
//! The camera rig only needs two things from a scene: which entity a ray
//! hits first, and where an entity currently is.

pub mod pick;
pub mod solar;

use glam::Vec3;

pub use pick::{PickHandle, PickHit, PickRegistry, PickShape, Ray};
pub use solar::SolarScene;

/// Identity of a selectable scene entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Queries the camera rig makes against the scene
pub trait SceneQuery {
    /// Nearest entity hit by the ray
    fn pick(&self, ray: &Ray) -> Option<EntityId>;

    /// Current world position of an entity
    fn world_position(&self, entity: EntityId) -> Option<Vec3>;
}
