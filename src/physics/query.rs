//! Spatial overlap queries.

use glam::Vec3;

use crate::ecs::components::physics::{BodyCategory, Collider, RigidBody};
use crate::ecs::components::transform::Transform;

/// A collider found by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyBody {
    pub entity: hecs::Entity,
    pub position: Vec3,
    /// Linear velocity of the attached rigid body, `None` when the collider has none.
    pub velocity: Option<Vec3>,
    pub category: BodyCategory,
}

/// Point + radius overlap query over the colliders of a scene.
pub trait ProximityQuery {
    /// All colliders whose bounds intersect the sphere at `center` with `radius`.
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<NearbyBody>;
}

impl ProximityQuery for hecs::World {
    fn overlap_sphere(&self, center: Vec3, radius: f32) -> Vec<NearbyBody> {
        let mut query =
            self.query::<(&Collider, &Transform, Option<&RigidBody>, Option<&BodyCategory>)>();

        query
            .iter()
            .filter(|(_, (collider, transform, _, _))| {
                let extent = collider.shape.bounding_radius() * transform.scale.abs().max_element();
                let reach = radius + extent;
                (transform.position - center).length_squared() <= reach * reach
            })
            .map(|(entity, (_, transform, rb, category))| NearbyBody {
                entity,
                position: transform.position,
                velocity: rb.map(|rb| rb.linear_velocity),
                category: category.copied().unwrap_or_default(),
            })
            .collect()
    }
}
