//! Minimal host physics for launcher scenes.
//!
//! # Architecture
//!
//! The physics pipeline runs in a fixed timestep loop:
//!
//! 1. Apply forces (gravity)
//! 2. Integrate velocities
//! 3. Pair detection (sphere-sphere, sphere-box)
//! 4. Resolve contacts with a single normal impulse and push-out; restitution
//!    only above the bounce threshold
//! 5. Report collision-enter events for pairs that started touching; a pair
//!    that drifts apart by less than the contact offset stays touching
//! 6. Integrate positions
//! 7. Clear force accumulators
//!
//! Sleeping bodies are frozen until a contact wakes them, which is how a
//! stacked target stays standing without a full constraint solver.

pub mod contact;
pub mod narrowphase;
pub mod query;
pub mod rigid_body;

use glam::Vec3;

use crate::ecs::components::physics::{
    BodyCategory, Collider, ColliderShape, RigidBody, RigidBodyType, SleepInfo, SleepState,
};
use crate::ecs::components::transform::Transform;

use self::contact::{Collision, CollisionEvent, ContactInfo, ContactPoint, TouchingPairs};
use self::narrowphase::detect_collision;

pub use self::query::{NearbyBody, ProximityQuery};

/// Penetration left in place after position correction so resting contacts persist.
const PENETRATION_SLOP: f32 = 0.005;

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.81, 0).
    pub gravity: Vec3,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per frame. Default: 4.
    pub max_substeps: u32,
    /// Closing speeds below this resolve without restitution. Default: 2 m/s.
    pub bounce_threshold: f32,
    /// Distance around every collider within which a touching pair stays
    /// touching after it separates. Default: 0.01.
    pub contact_offset: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            bounce_threshold: 2.0,
            contact_offset: 0.01,
        }
    }
}

/// Snapshot of one collider taken at the start of the contact phase.
#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    entity: hecs::Entity,
    shape: ColliderShape,
    transform: Transform,
    body_type: Option<RigidBodyType>,
    inv_mass: f32,
    velocity: Vec3,
    restitution: f32,
    category: BodyCategory,
    sleeping: bool,
    dirty: bool,
}

impl BodyEntry {
    fn is_active(&self) -> bool {
        self.inv_mass > 0.0 && !self.sleeping
    }

    /// Anything with a non-static rigid body counts as a dynamics-bearing body.
    fn dynamics_ref(&self) -> Option<hecs::Entity> {
        match self.body_type {
            Some(RigidBodyType::Static) | None => None,
            Some(_) => Some(self.entity),
        }
    }
}

/// The main physics world managing simulation state.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    touching: TouchingPairs,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            touching: TouchingPairs::new(),
        }
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator. Returns the collision-enter events
    /// of every sub-step, in order.
    pub fn step(&mut self, world: &mut hecs::World, delta_time: f64) -> Vec<CollisionEvent> {
        self.accumulator += delta_time;

        let mut events = Vec::new();
        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            events.extend(self.fixed_step(world, self.config.fixed_timestep as f32));
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }

        events
    }

    fn fixed_step(&mut self, world: &mut hecs::World, dt: f32) -> Vec<CollisionEvent> {
        rigid_body::apply_gravity(world, self.config.gravity);
        rigid_body::integrate_velocities(world, dt);

        let mut entries = collect_entries(world);
        let mut events = Vec::new();
        let mut touching_now = Vec::new();
        let offset = self.config.contact_offset.max(0.0);
        let margin = offset * 2.0;

        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                if !entries[i].is_active() && !entries[j].is_active() {
                    continue;
                }
                let Some(mut info) = detect_collision(
                    &entries[i].shape.inflated(offset),
                    &entries[i].transform,
                    &entries[j].shape.inflated(offset),
                    &entries[j].transform,
                ) else {
                    continue;
                };

                let (a, b) = (entries[i].entity, entries[j].entity);
                let started = self.touching.started(a, b);
                info.penetration -= margin;
                if info.penetration <= 0.0 {
                    // Within the contact offset: a touching pair stays touching.
                    if !started {
                        touching_now.push((a, b));
                    }
                    continue;
                }
                touching_now.push((a, b));

                let (first, second) = entries.split_at_mut(j);
                let pair_events = resolve_contact(
                    &mut first[i],
                    &mut second[0],
                    &info,
                    self.config.bounce_threshold,
                );
                if started {
                    events.extend(pair_events);
                }
            }
        }

        self.touching.update(touching_now);
        write_back(world, &entries);

        rigid_body::integrate_positions(world, dt);
        rigid_body::clear_forces(world);

        events
    }
}

fn collect_entries(world: &hecs::World) -> Vec<BodyEntry> {
    let mut query = world.query::<(
        &Collider,
        &Transform,
        Option<&RigidBody>,
        Option<&SleepInfo>,
        Option<&BodyCategory>,
    )>();

    query
        .iter()
        .map(|(entity, (collider, transform, rb, sleep, category))| BodyEntry {
            entity,
            shape: collider.shape,
            transform: *transform,
            body_type: rb.map(|rb| rb.body_type),
            inv_mass: rb.map_or(0.0, RigidBody::inverse_mass),
            velocity: rb.map_or(Vec3::ZERO, |rb| rb.linear_velocity),
            restitution: rb.map_or(0.0, |rb| rb.restitution),
            category: category.copied().unwrap_or_default(),
            sleeping: sleep.is_some_and(|s| s.is_sleeping()),
            dirty: false,
        })
        .collect()
}

/// Apply a normal impulse and positional correction to a touching pair and
/// build the collision events each side would receive.
///
/// Restitution only applies when the closing speed exceeds `bounce_threshold`.
fn resolve_contact(
    a: &mut BodyEntry,
    b: &mut BodyEntry,
    info: &ContactInfo,
    bounce_threshold: f32,
) -> [CollisionEvent; 2] {
    let relative_velocity = b.velocity - a.velocity;
    let approach = relative_velocity.dot(info.normal);
    let inv_mass_sum = a.inv_mass + b.inv_mass;

    let mut impulse = Vec3::ZERO;
    if inv_mass_sum > 0.0 {
        if approach < 0.0 {
            let restitution = if -approach > bounce_threshold {
                (a.restitution + b.restitution) * 0.5
            } else {
                0.0
            };
            let j = -(1.0 + restitution) * approach / inv_mass_sum;
            impulse = info.normal * j;
        }

        let push_out = (info.penetration - PENETRATION_SLOP).max(0.0);
        let correction = info.normal * (push_out / inv_mass_sum);
        for (entry, sign) in [(&mut *a, -1.0), (&mut *b, 1.0)] {
            if entry.inv_mass > 0.0 {
                entry.velocity += impulse * sign * entry.inv_mass;
                entry.transform.position += correction * sign * entry.inv_mass;
                entry.sleeping = false;
                entry.dirty = true;
            }
        }
    }

    let event_for = |receiver: &BodyEntry, other: &BodyEntry, velocity: Vec3, impulse: Vec3| {
        CollisionEvent {
            entity: receiver.entity,
            collision: Collision {
                other: other.entity,
                other_category: other.category,
                contacts: vec![ContactPoint {
                    position: info.point,
                    body: other.dynamics_ref(),
                }],
                relative_velocity: velocity,
                impulse,
            },
        }
    };

    [
        event_for(a, b, -relative_velocity, -impulse),
        event_for(b, a, relative_velocity, impulse),
    ]
}

fn write_back(world: &mut hecs::World, entries: &[BodyEntry]) {
    for entry in entries.iter().filter(|e| e.dirty) {
        if let Ok(mut rb) = world.get::<&mut RigidBody>(entry.entity) {
            rb.linear_velocity = entry.velocity;
        }
        if let Ok(mut transform) = world.get::<&mut Transform>(entry.entity) {
            transform.position = entry.transform.position;
        }
        if let Ok(mut sleep) = world.get::<&mut SleepInfo>(entry.entity) {
            sleep.state = SleepState::Awake;
        }
    }
}
