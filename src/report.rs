//! Shot reports, scores and persisted shot records.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::impact::ImpactResult;
use crate::launch::LaunchParameters;

/// Upper bound of the score.
pub const MAX_SCORE: i32 = 9999;

/// What the launcher produces once an impact has been classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Human-readable report with a score.
    #[default]
    Report,
    /// Structured [`ShotResult`] handed to the shot sink.
    ShotRecord,
}

/// `pieces_down * 100 + round(impulse * 10)`, clamped to `0..=9999`.
///
/// Halfway cases round to the nearest even integer.
pub fn score(impact: &ImpactResult) -> i32 {
    let impulse_points = (impact.collision_impulse * 10.0).round_ties_even() as i64;
    let raw = i64::from(impact.pieces_down) * 100 + impulse_points;
    raw.clamp(0, i64::from(MAX_SCORE)) as i32
}

fn format_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

/// Multi-line report for one impact.
pub fn format_report(impact: &ImpactResult) -> String {
    format!(
        "--- Shot report ---\n\
         Time of flight: {:.2} s\n\
         Impact point: {}\n\
         Relative speed: {:.2} m/s\n\
         Collision impulse: {:.2} N·s\n\
         Pieces down: {}\n\
         Score: {}\n\
         ----------------------",
        impact.time_of_flight,
        format_vec3(impact.impact_point),
        impact.relative_speed,
        impact.collision_impulse,
        impact.pieces_down,
        score(impact),
    )
}

/// Status line shown right after firing.
pub fn fire_summary(params: &LaunchParameters) -> String {
    format!(
        "Fired: angle={:.1}°, force={:.1}, mass={:.2}kg",
        params.angle, params.force, params.mass
    )
}

/// Persisted record of one shot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShotResult {
    pub angle: f32,
    pub force: f32,
    pub mass: f32,
    pub hit: bool,
    /// Distance from the impact point to the reference origin.
    pub distance: f32,
    pub affected: u32,
}

impl ShotResult {
    pub fn new(
        angle: f32,
        force: f32,
        mass: f32,
        hit: bool,
        distance: f32,
        affected: u32,
    ) -> Self {
        Self {
            angle,
            force,
            mass,
            hit,
            distance,
            affected,
        }
    }

    /// Combine the launch inputs with the classified impact.
    ///
    /// `hit` is set when at least one body was affected.
    pub fn from_impact(params: &LaunchParameters, impact: &ImpactResult, origin: Vec3) -> Self {
        Self::new(
            params.angle,
            params.force,
            params.mass,
            impact.pieces_down > 0,
            impact.impact_point.distance(origin),
            impact.pieces_down,
        )
    }
}
