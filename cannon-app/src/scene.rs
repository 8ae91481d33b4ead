use glam::Vec3;

use cannon::ecs::prelude::*;

/// Half size of one structure block.
const BLOCK_HALF: f32 = 0.25;

pub struct Scene {
    pub spawn_point: Transform,
    pub barrel: hecs::Entity,
    pub pieces: Vec<hecs::Entity>,
}

/// Ground plane, launcher at the origin and a block wall down range.
pub fn build(world: &mut hecs::World, wall_x: f32, columns: u32, rows: u32) -> Scene {
    world.spawn((
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        Collider::cuboid(Vec3::new(50.0, 0.5, 50.0)),
        RigidBody {
            restitution: 0.0,
            ..RigidBody::new_static()
        },
        BodyCategory::Ground,
    ));

    let spawn_point = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
    let barrel = world.spawn((spawn_point, Barrel));

    let mut pieces = Vec::with_capacity((columns * rows) as usize);
    for column in 0..columns {
        for row in 0..rows {
            let position = Vec3::new(
                wall_x + column as f32 * BLOCK_HALF * 2.0,
                BLOCK_HALF + row as f32 * BLOCK_HALF * 2.0,
                0.0,
            );
            pieces.push(world.spawn((
                Transform::from_position(position),
                Collider::cuboid(Vec3::splat(BLOCK_HALF)),
                RigidBody::new_dynamic(0.5),
                BodyCategory::StructurePiece,
                // The wall stands until something knocks into it.
                SleepInfo::asleep(),
            )));
        }
    }

    Scene {
        spawn_point,
        barrel,
        pieces,
    }
}
