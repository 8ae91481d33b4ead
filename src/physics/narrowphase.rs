//! Narrowphase collision detection for the shapes the launcher scenes use.
//!
//! Only pairs involving at least one sphere produce contacts; box-box pairs are
//! ignored.

use glam::Vec3;

use crate::ecs::components::physics::ColliderShape;
use crate::ecs::components::transform::Transform;

use super::contact::ContactInfo;

fn max_scale(transform: &Transform) -> f32 {
    transform.scale.abs().max_element()
}

/// Specialized sphere-sphere intersection test. Normal points from A to B.
pub fn sphere_sphere(
    radius_a: f32,
    transform_a: &Transform,
    radius_b: f32,
    transform_b: &Transform,
) -> Option<ContactInfo> {
    let center_a = transform_a.position;
    let center_b = transform_b.position;
    let world_radius_a = radius_a * max_scale(transform_a);
    let world_radius_b = radius_b * max_scale(transform_b);

    let diff = center_b - center_a;
    let dist_sq = diff.length_squared();
    let min_dist = world_radius_a + world_radius_b;

    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { diff / dist } else { Vec3::Y };

    let penetration = min_dist - dist;
    let point = center_a + normal * (world_radius_a - penetration * 0.5);

    Some(ContactInfo {
        normal,
        penetration,
        point,
    })
}

/// Box-sphere intersection test. Normal points from the box to the sphere.
pub fn box_sphere(
    half_extents: Vec3,
    box_transform: &Transform,
    radius: f32,
    sphere_transform: &Transform,
) -> Option<ContactInfo> {
    let sphere_center = sphere_transform.position;
    let box_center = box_transform.position;
    let world_radius = radius * max_scale(sphere_transform);

    let box_axes = [
        box_transform.rotation * Vec3::X,
        box_transform.rotation * Vec3::Y,
        box_transform.rotation * Vec3::Z,
    ];
    let scaled_half = half_extents * box_transform.scale.abs();

    // Sphere center in the box's local frame
    let diff = sphere_center - box_center;
    let local = Vec3::new(
        diff.dot(box_axes[0]),
        diff.dot(box_axes[1]),
        diff.dot(box_axes[2]),
    );

    let clamped = local.clamp(-scaled_half, scaled_half);
    let closest_world =
        box_center + box_axes[0] * clamped.x + box_axes[1] * clamped.y + box_axes[2] * clamped.z;

    let to_sphere = sphere_center - closest_world;
    let dist_sq = to_sphere.length_squared();

    if dist_sq >= world_radius * world_radius {
        return None;
    }

    let dist = dist_sq.sqrt();

    // Sphere center inside the box: push out along the shallowest face
    if dist < 1e-6 {
        let mut min_pen = f32::MAX;
        let mut normal = Vec3::Y;
        for i in 0..3 {
            let pen_pos = scaled_half[i] - local[i];
            let pen_neg = scaled_half[i] + local[i];
            if pen_pos < min_pen {
                min_pen = pen_pos;
                normal = box_axes[i];
            }
            if pen_neg < min_pen {
                min_pen = pen_neg;
                normal = -box_axes[i];
            }
        }
        return Some(ContactInfo {
            normal,
            penetration: min_pen + world_radius,
            point: sphere_center - normal * world_radius,
        });
    }

    Some(ContactInfo {
        normal: to_sphere / dist,
        penetration: world_radius - dist,
        point: closest_world,
    })
}

/// Detect collision between two shapes. The returned normal points from A to B.
pub fn detect_collision(
    shape_a: &ColliderShape,
    transform_a: &Transform,
    shape_b: &ColliderShape,
    transform_b: &Transform,
) -> Option<ContactInfo> {
    match (shape_a, shape_b) {
        (ColliderShape::Sphere { radius: ra }, ColliderShape::Sphere { radius: rb }) => {
            sphere_sphere(*ra, transform_a, *rb, transform_b)
        }
        (ColliderShape::Box { half_extents }, ColliderShape::Sphere { radius }) => {
            box_sphere(*half_extents, transform_a, *radius, transform_b)
        }
        (ColliderShape::Sphere { radius }, ColliderShape::Box { half_extents }) => {
            box_sphere(*half_extents, transform_b, *radius, transform_a).map(|info| ContactInfo {
                normal: -info.normal,
                ..info
            })
        }
        (ColliderShape::Box { .. }, ColliderShape::Box { .. }) => None,
    }
}
