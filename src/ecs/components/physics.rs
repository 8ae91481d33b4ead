//! Physics components for ECS entities.

use glam::Vec3;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// Affected by forces and collisions.
    Dynamic,
    /// Immovable.
    Static,
}

/// How a vector handed to [`RigidBody::apply_force`] changes the body's motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    /// Continuous force, integrated over the next step using the body's mass.
    Force,
    /// Continuous acceleration, integrated over the next step ignoring mass.
    Acceleration,
    /// Instant change of momentum: `v += f / m`.
    #[default]
    Impulse,
    /// Instant change of velocity ignoring mass: `v += f`.
    VelocityChange,
}

/// Rigid body component.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    pub mass: f32,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub force_accumulator: Vec3,
    /// Linear damping factor (default: 0.0).
    pub linear_damping: f32,
    /// Coefficient of restitution (0.0 - 1.0, default: 0.0).
    pub restitution: f32,
    /// Gravity scale (default: 1.0).
    pub gravity_scale: f32,
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            mass,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force_accumulator: Vec3::ZERO,
            linear_damping: 0.0,
            restitution: 0.0,
            gravity_scale: 1.0,
        }
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            mass: 0.0,
            gravity_scale: 0.0,
            ..Self::new_dynamic(0.0)
        }
    }

    /// Inverse mass, zero for anything that is not a dynamic body with positive mass.
    pub fn inverse_mass(&self) -> f32 {
        if self.body_type == RigidBodyType::Dynamic && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Apply `vector` to the body according to `mode`.
    ///
    /// Continuous modes land in the force accumulator and take effect on the
    /// next integration step; instantaneous modes change the velocity now.
    /// Non-dynamic bodies ignore the call.
    pub fn apply_force(&mut self, vector: Vec3, mode: ForceMode) {
        if self.body_type != RigidBodyType::Dynamic {
            return;
        }
        match mode {
            ForceMode::Force => self.force_accumulator += vector,
            ForceMode::Acceleration => self.force_accumulator += vector * self.mass,
            ForceMode::Impulse => self.linear_velocity += vector * self.inverse_mass(),
            ForceMode::VelocityChange => self.linear_velocity += vector,
        }
    }

    /// Zero both velocities and the force accumulator.
    pub fn reset_motion(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.force_accumulator = Vec3::ZERO;
    }
}

/// Sleep state for a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    Awake,
    Sleeping,
}

/// Sleep tracking component. Sleeping bodies skip gravity and integration
/// until a contact wakes them.
#[derive(Debug, Clone, Copy)]
pub struct SleepInfo {
    pub state: SleepState,
}

impl SleepInfo {
    pub fn asleep() -> Self {
        Self {
            state: SleepState::Sleeping,
        }
    }

    pub fn is_sleeping(&self) -> bool {
        self.state == SleepState::Sleeping
    }
}

/// Collider shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
}

impl ColliderShape {
    /// Radius of the smallest sphere around the shape's origin that contains it.
    pub fn bounding_radius(&self) -> f32 {
        match self {
            ColliderShape::Sphere { radius } => *radius,
            ColliderShape::Box { half_extents } => half_extents.length(),
        }
    }

    /// The shape grown by `margin` on every side.
    pub fn inflated(&self, margin: f32) -> Self {
        match *self {
            ColliderShape::Sphere { radius } => ColliderShape::Sphere {
                radius: radius + margin,
            },
            ColliderShape::Box { half_extents } => ColliderShape::Box {
                half_extents: half_extents + Vec3::splat(margin),
            },
        }
    }
}

/// Collision detection component.
#[derive(Debug, Clone, Copy)]
pub struct Collider {
    pub shape: ColliderShape,
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Sphere { radius },
        }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Self {
            shape: ColliderShape::Box { half_extents },
        }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::sphere(0.5)
    }
}

/// Gameplay category of a collider-bearing entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodyCategory {
    /// Part of the destructible target.
    StructurePiece,
    Projectile,
    Ground,
    #[default]
    Other,
}

impl BodyCategory {
    pub fn is_structure_piece(self) -> bool {
        self == BodyCategory::StructurePiece
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_divides_by_mass() {
        let mut rb = RigidBody::new_dynamic(2.0);
        rb.apply_force(Vec3::new(0.0, 10.0, 0.0), ForceMode::Impulse);
        assert_eq!(rb.linear_velocity, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(rb.force_accumulator, Vec3::ZERO);
    }

    #[test]
    fn test_velocity_change_ignores_mass() {
        let mut rb = RigidBody::new_dynamic(4.0);
        rb.apply_force(Vec3::X, ForceMode::VelocityChange);
        assert_eq!(rb.linear_velocity, Vec3::X);
    }

    #[test]
    fn test_continuous_modes_accumulate() {
        let mut rb = RigidBody::new_dynamic(3.0);
        rb.apply_force(Vec3::X, ForceMode::Force);
        rb.apply_force(Vec3::Y, ForceMode::Acceleration);
        assert_eq!(rb.force_accumulator, Vec3::new(1.0, 3.0, 0.0));
        assert_eq!(rb.linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_static_body_ignores_forces() {
        let mut rb = RigidBody::new_static();
        rb.apply_force(Vec3::ONE, ForceMode::VelocityChange);
        assert_eq!(rb.linear_velocity, Vec3::ZERO);
        assert_eq!(rb.inverse_mass(), 0.0);
    }

    #[test]
    fn test_inflated_shape() {
        let sphere = Collider::sphere(0.25).shape.inflated(0.5);
        assert_eq!(sphere, ColliderShape::Sphere { radius: 0.75 });
        let cuboid = Collider::cuboid(Vec3::ONE).shape.inflated(0.5);
        assert_eq!(
            cuboid,
            ColliderShape::Box {
                half_extents: Vec3::splat(1.5)
            }
        );
    }

    #[test]
    fn test_bounding_radius() {
        assert_eq!(Collider::sphere(0.25).shape.bounding_radius(), 0.25);
        let cuboid = Collider::cuboid(Vec3::new(3.0, 4.0, 0.0));
        assert!((cuboid.shape.bounding_radius() - 5.0).abs() < 1e-6);
    }
}
