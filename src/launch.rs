//! Launch parameter resolution.
//!
//! Converts the launcher's angle / force / mass inputs into a launch vector and
//! primes a projectile's rigid body with it. Angles are in degrees, measured
//! clockwise from the spawn point's up axis in the XY firing plane.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::components::physics::{ForceMode, RigidBody};

/// Lower bound applied to the projectile mass.
pub const MIN_MASS: f32 = 0.0001;

/// Inputs captured at fire time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParameters {
    /// Degrees, clockwise from the spawn up axis. Not wrapped.
    pub angle: f32,
    /// Launch magnitude. Negative values invert the direction.
    pub force: f32,
    /// Requested mass in kg, see [`LaunchParameters::effective_mass`].
    pub mass: f32,
}

impl LaunchParameters {
    pub fn new(angle: f32, force: f32, mass: f32) -> Self {
        Self { angle, force, mass }
    }

    /// Mass actually given to the body; never below [`MIN_MASS`].
    pub fn effective_mass(&self) -> f32 {
        self.mass.max(MIN_MASS)
    }
}

impl Default for LaunchParameters {
    fn default() -> Self {
        Self::new(45.0, 10.0, 1.0)
    }
}

/// How the launch vector is handed to the projectile body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "force_mode", rename_all = "snake_case")]
pub enum LaunchMode {
    /// Apply the vector to a body at rest with the given force mode.
    AddForce(ForceMode),
    /// Overwrite the body's linear velocity with the vector.
    SetVelocity,
}

impl Default for LaunchMode {
    fn default() -> Self {
        LaunchMode::AddForce(ForceMode::Impulse)
    }
}

/// Rotation of the barrel for a given aim angle (clockwise about +Z).
pub fn barrel_rotation(angle: f32) -> Quat {
    Quat::from_rotation_z((-angle).to_radians())
}

/// Unit launch direction: `up` rotated clockwise by `angle` degrees in the firing plane.
///
/// Returns zero if `up` is degenerate.
pub fn launch_direction(angle: f32, up: Vec3) -> Vec3 {
    (barrel_rotation(angle) * up).normalize_or_zero()
}

/// Launch vector for `params` fired from a spawn point whose up axis is `up`.
pub fn launch_vector(params: &LaunchParameters, up: Vec3) -> Vec3 {
    launch_direction(params.angle, up) * params.force
}

/// Endpoints of the debug aim segment drawn from the spawn point.
pub fn aim_line(origin: Vec3, angle: f32, up: Vec3, length: f32) -> (Vec3, Vec3) {
    (origin, origin + launch_direction(angle, up) * length)
}

/// Prime `body` for a new shot.
///
/// Sets the effective mass and clears all previous motion state before the
/// launch vector is applied, so repeated fires never accumulate.
pub fn apply_launch(
    body: &mut RigidBody,
    params: &LaunchParameters,
    vector: Vec3,
    mode: LaunchMode,
) {
    body.mass = params.effective_mass();
    body.reset_motion();

    match mode {
        LaunchMode::AddForce(force_mode) => body.apply_force(vector, force_mode),
        LaunchMode::SetVelocity => body.linear_velocity = vector,
    }
}
