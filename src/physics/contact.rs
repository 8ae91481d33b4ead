//! Contact and collision event data handed from the physics step to gameplay code.

use std::collections::HashSet;

use glam::Vec3;

use crate::ecs::components::physics::BodyCategory;

/// Information about a single contact between two shapes.
#[derive(Debug, Clone, Copy)]
pub struct ContactInfo {
    /// Contact normal (from shape A to shape B).
    pub normal: Vec3,
    /// Penetration depth.
    pub penetration: f32,
    /// Contact point in world space.
    pub point: Vec3,
}

/// A single contact point as seen from one side of a collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Contact position in world space.
    pub position: Vec3,
    /// Dynamics-bearing body on the other side of the contact, if any.
    pub body: Option<hecs::Entity>,
}

/// Collision data reported to one of the two participants.
#[derive(Debug, Clone)]
pub struct Collision {
    /// The entity that was hit.
    pub other: hecs::Entity,
    pub other_category: BodyCategory,
    pub contacts: Vec<ContactPoint>,
    /// Velocity of the receiver relative to `other` just before the response.
    pub relative_velocity: Vec3,
    /// Impulse applied to the receiver to resolve the contact.
    pub impulse: Vec3,
}

/// A collision-enter notification addressed to `entity`.
#[derive(Debug, Clone)]
pub struct CollisionEvent {
    pub entity: hecs::Entity,
    pub collision: Collision,
}

/// Pairs that were in contact at the end of the previous step.
///
/// Used to report a collision only on the step where a pair starts touching.
#[derive(Debug, Default)]
pub struct TouchingPairs {
    pairs: HashSet<(hecs::Entity, hecs::Entity)>,
}

impl TouchingPairs {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the pair was not touching last step.
    pub fn started(&self, a: hecs::Entity, b: hecs::Entity) -> bool {
        !self.pairs.contains(&Self::pair_key(a, b))
    }

    /// Replace the cached set with this step's touching pairs.
    pub fn update(&mut self, pairs: impl IntoIterator<Item = (hecs::Entity, hecs::Entity)>) {
        self.pairs = pairs
            .into_iter()
            .map(|(a, b)| Self::pair_key(a, b))
            .collect();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Canonical pair key (smaller entity first).
    fn pair_key(a: hecs::Entity, b: hecs::Entity) -> (hecs::Entity, hecs::Entity) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_starts_once() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());

        let mut touching = TouchingPairs::new();
        assert!(touching.started(a, b));

        touching.update([(b, a)]);
        assert!(!touching.started(a, b));
        assert!(!touching.started(b, a));

        touching.update(std::iter::empty());
        assert!(touching.started(a, b));
        assert!(touching.is_empty());
    }
}
