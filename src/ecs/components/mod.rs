//! ECS components (transform, physics, projectile).

pub mod physics;
pub mod projectile;
pub mod transform;

pub use physics::*;
pub use projectile::*;
pub use transform::*;
