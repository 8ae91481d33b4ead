//! Scene builders shared by the cannon benchmarks.

use cannon::ecs::prelude::*;
use cannon::physics::contact::{Collision, ContactPoint};
use cannon::{PhysicsConfig, PhysicsWorld};
use glam::Vec3;

/// Half size of a structure block.
pub const BLOCK_HALF: f32 = 0.25;

/// A `columns` x `rows` wall of sleeping blocks starting at `origin`.
pub fn spawn_wall(
    world: &mut hecs::World,
    origin: Vec3,
    columns: u32,
    rows: u32,
) -> Vec<hecs::Entity> {
    let mut pieces = Vec::with_capacity((columns * rows) as usize);
    for column in 0..columns {
        for row in 0..rows {
            let offset = Vec3::new(column as f32, row as f32, 0.0) * BLOCK_HALF * 2.0;
            pieces.push(world.spawn((
                Transform::from_position(origin + offset),
                Collider::cuboid(Vec3::splat(BLOCK_HALF)),
                RigidBody::new_dynamic(0.5),
                BodyCategory::StructurePiece,
                SleepInfo::asleep(),
            )));
        }
    }
    pieces
}

/// Ground, a wall of `n` x `n` blocks and a ball already flying at it.
pub fn setup_shot_scene(n: u32) -> (hecs::World, PhysicsWorld) {
    let mut world = hecs::World::new();
    world.spawn((
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        Collider::cuboid(Vec3::new(100.0, 0.5, 100.0)),
        RigidBody::new_static(),
        BodyCategory::Ground,
    ));
    spawn_wall(&mut world, Vec3::new(3.0, BLOCK_HALF, 0.0), n, n);

    let mut ball = RigidBody::new_dynamic(1.0);
    ball.linear_velocity = Vec3::new(12.0, 0.0, 0.0);
    world.spawn((
        Transform::from_position(Vec3::new(0.0, 1.0, 0.0)),
        Collider::sphere(0.2),
        ball,
        BodyCategory::Projectile,
    ));

    (world, PhysicsWorld::new(PhysicsConfig::default()))
}

/// `n` falling blocks scattered around the origin, for the proximity gauge.
pub fn setup_debris_world(n: u32) -> hecs::World {
    let mut world = hecs::World::new();
    for i in 0..n {
        let angle = i as f32 * 0.618 * std::f32::consts::TAU;
        let distance = (i % 40) as f32 * 0.1;
        let mut body = RigidBody::new_dynamic(0.5);
        body.linear_velocity = Vec3::new(0.0, -((i % 3) as f32), 0.0);
        let position = Vec3::new(angle.cos() * distance, 0.5, angle.sin() * distance);
        world.spawn((
            Transform::from_position(position),
            Collider::cuboid(Vec3::splat(BLOCK_HALF)),
            body,
            BodyCategory::StructurePiece,
        ));
    }
    world
}

/// A structure hit whose contact set references `n` bodies, half of them repeated.
pub fn setup_collision(n: usize) -> Collision {
    let mut world = hecs::World::new();
    let bodies: Vec<hecs::Entity> = (0..n.div_ceil(2).max(1))
        .map(|_| world.spawn(()))
        .collect();
    let contacts = (0..n)
        .map(|i| ContactPoint {
            position: Vec3::new(i as f32 * 0.1, 1.0, 0.0),
            body: Some(bodies[i % bodies.len()]),
        })
        .collect();
    Collision {
        other: bodies[0],
        other_category: BodyCategory::StructurePiece,
        contacts,
        relative_velocity: Vec3::new(-9.0, 1.0, 0.0),
        impulse: Vec3::new(-4.0, 0.5, 0.0),
    }
}
