//! Rigid body integration functions.

use glam::Vec3;

use crate::ecs::components::physics::{RigidBody, RigidBodyType, SleepInfo};
use crate::ecs::components::transform::Transform;

fn is_active(rb: &RigidBody, sleep: Option<&SleepInfo>) -> bool {
    rb.body_type == RigidBodyType::Dynamic && !sleep.is_some_and(|s| s.is_sleeping())
}

/// Apply gravity force to all awake dynamic rigid bodies.
pub fn apply_gravity(world: &mut hecs::World, gravity: Vec3) {
    for (_, (rb, sleep)) in world.query_mut::<(&mut RigidBody, Option<&SleepInfo>)>() {
        if is_active(rb, sleep) && rb.mass > 0.0 {
            rb.force_accumulator += gravity * rb.mass * rb.gravity_scale;
        }
    }
}

/// Integrate velocities using semi-implicit Euler: v += (F/m) * dt.
pub fn integrate_velocities(world: &mut hecs::World, dt: f32) {
    for (_, (rb, sleep)) in world.query_mut::<(&mut RigidBody, Option<&SleepInfo>)>() {
        if !is_active(rb, sleep) || rb.mass <= 0.0 {
            continue;
        }

        let inv_mass = 1.0 / rb.mass;
        rb.linear_velocity += rb.force_accumulator * inv_mass * dt;
        rb.linear_velocity *= (1.0 - rb.linear_damping).max(0.0);
    }
}

/// Integrate positions: p += v * dt.
pub fn integrate_positions(world: &mut hecs::World, dt: f32) {
    for (_, (rb, transform, sleep)) in
        world.query_mut::<(&RigidBody, &mut Transform, Option<&SleepInfo>)>()
    {
        if is_active(rb, sleep) {
            transform.position += rb.linear_velocity * dt;
        }
    }
}

/// Clear the force accumulator on all rigid bodies.
pub fn clear_forces(world: &mut hecs::World) {
    for (_, rb) in world.query_mut::<&mut RigidBody>() {
        rb.force_accumulator = Vec3::ZERO;
    }
}
