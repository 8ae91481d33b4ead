//! Impact classification.
//!
//! A projectile's collision is turned into an [`ImpactResult`] only when it
//! strikes a structure piece; the number of distinct bodies touched by the
//! contact set becomes `pieces_down`. The proximity sweep that counts fallen
//! pieces around a point is kept as a separate gauge and never decides whether
//! a result is produced.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::physics::contact::Collision;
use crate::physics::query::ProximityQuery;

/// Outcome of one classified projectile collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactResult {
    /// Seconds between firing and the collision.
    pub time_of_flight: f32,
    pub impact_point: Vec3,
    /// Magnitude of the collision's relative velocity.
    pub relative_speed: f32,
    /// Magnitude of the collision impulse.
    pub collision_impulse: f32,
    /// Distinct dynamics bodies referenced by the contact points.
    pub pieces_down: u32,
}

/// Tuning for the fallen-piece gauge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// Radius of the sweep around the projectile.
    pub check_radius: f32,
    /// Pieces below this height count as fallen.
    pub fallen_height_threshold: f32,
    /// Pieces moving down faster than this (negative) vertical speed count as fallen.
    pub fallen_velocity_threshold: f32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            check_radius: 2.0,
            fallen_height_threshold: -1.0,
            fallen_velocity_threshold: -0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImpactClassifier {
    config: HeuristicConfig,
}

impl ImpactClassifier {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Classify a projectile collision.
    ///
    /// Returns `None` unless the other participant is a structure piece.
    /// `fallback_position` (the projectile's position) is used as the impact
    /// point when the collision carries no contacts.
    pub fn classify(
        &self,
        collision: &Collision,
        launch_time: f64,
        now: f64,
        fallback_position: Vec3,
    ) -> Option<ImpactResult> {
        if !collision.other_category.is_structure_piece() {
            debug!(
                other = ?collision.other,
                category = ?collision.other_category,
                "collision ignored"
            );
            return None;
        }

        let impact_point = collision
            .contacts
            .first()
            .map_or(fallback_position, |contact| contact.position);

        let affected: HashSet<hecs::Entity> = collision
            .contacts
            .iter()
            .filter_map(|contact| contact.body)
            .collect();

        Some(ImpactResult {
            time_of_flight: (now - launch_time) as f32,
            impact_point,
            relative_speed: collision.relative_velocity.length(),
            collision_impulse: collision.impulse.length(),
            pieces_down: affected.len() as u32,
        })
    }

    /// Count fallen structure pieces within `check_radius` of `center`.
    ///
    /// Colliders without a rigid body are skipped.
    pub fn count_fallen_nearby<Q>(&self, query: &Q, center: Vec3) -> u32
    where
        Q: ProximityQuery + ?Sized,
    {
        query
            .overlap_sphere(center, self.config.check_radius)
            .into_iter()
            .filter(|body| body.category.is_structure_piece())
            .filter(|body| match body.velocity {
                Some(velocity) => {
                    velocity.y < self.config.fallen_velocity_threshold
                        || body.position.y < self.config.fallen_height_threshold
                }
                None => false,
            })
            .count() as u32
    }
}
