//! Cannon-specific components.

/// Attached to a fired projectile. Records when it left the barrel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileTracker {
    /// Simulation time (seconds) at which the projectile was fired.
    pub launch_time: f64,
}

/// Marks the entity whose rotation mirrors the launcher's aim angle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Barrel;
