//! Cannon controller.
//!
//! Owns the launcher inputs, fires projectiles into a hecs world and turns
//! the projectile's collision-enter events into reports or shot records.
//!
//! Impact delivery goes through an [`ImpactSlot`]: a single handler bound to
//! one projectile entity. Firing again replaces the binding before the old
//! projectile is despawned, so a stale projectile can never reach the new
//! handler and handlers never pile up.

use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, error, info, warn};

use crate::config::CannonConfig;
use crate::controls::LauncherControls;
use crate::ecs::components::physics::{BodyCategory, Collider, RigidBody};
use crate::ecs::components::projectile::{Barrel, ProjectileTracker};
use crate::ecs::components::transform::Transform;
use crate::impact::{ImpactClassifier, ImpactResult};
use crate::launch::{self, LaunchMode, LaunchParameters};
use crate::persistence::ShotSink;
use crate::physics::contact::CollisionEvent;
use crate::report::{self, OutputMode, ShotResult};

/// Reasons a fire request is refused. Nothing is spawned in either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FireError {
    #[error("projectile template not assigned")]
    MissingTemplate,
    #[error("spawn point not assigned")]
    MissingSpawnPoint,
    #[error("projectile template must have a rigid body")]
    MissingRigidBody,
}

/// What gets spawned on every fire.
#[derive(Debug, Clone)]
pub struct ProjectileTemplate {
    pub collider: Collider,
    pub body: Option<RigidBody>,
}

impl ProjectileTemplate {
    /// A dynamic ball of the given radius.
    pub fn ball(radius: f32) -> Self {
        Self {
            collider: Collider::sphere(radius),
            body: Some(RigidBody::new_dynamic(1.0)),
        }
    }
}

/// Receives classified impacts of the subscribed projectile.
pub trait ImpactHandler {
    fn on_impact(&mut self, impact: &ImpactResult);
}

impl<F> ImpactHandler for F
where
    F: FnMut(&ImpactResult),
{
    fn on_impact(&mut self, impact: &ImpactResult) {
        self(impact)
    }
}

/// Single-subscriber impact slot bound to one projectile entity.
pub struct ImpactSlot<H> {
    subscriber: Option<(hecs::Entity, H)>,
}

impl<H: ImpactHandler> ImpactSlot<H> {
    pub fn new() -> Self {
        Self { subscriber: None }
    }

    /// Bind `handler` to `projectile`, returning the handler it replaced.
    pub fn subscribe(&mut self, projectile: hecs::Entity, handler: H) -> Option<H> {
        self.subscriber
            .replace((projectile, handler))
            .map(|(_, old)| old)
    }

    pub fn unsubscribe(&mut self) -> Option<H> {
        self.subscriber.take().map(|(_, handler)| handler)
    }

    pub fn subscriber(&self) -> Option<hecs::Entity> {
        self.subscriber.as_ref().map(|(entity, _)| *entity)
    }

    pub fn handler(&self) -> Option<&H> {
        self.subscriber.as_ref().map(|(_, handler)| handler)
    }

    /// Hand `impact` to the handler if `projectile` is the subscribed one.
    pub fn deliver(&mut self, projectile: hecs::Entity, impact: &ImpactResult) -> bool {
        match &mut self.subscriber {
            Some((entity, handler)) if *entity == projectile => {
                handler.on_impact(impact);
                true
            }
            _ => false,
        }
    }
}

impl<H: ImpactHandler> Default for ImpactSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Output handler installed for each shot.
pub struct ShotOutput {
    mode: OutputMode,
    params: LaunchParameters,
    origin: Vec3,
    sink: Option<Arc<dyn ShotSink>>,
    report: Option<String>,
    impacts: u32,
}

impl ShotOutput {
    pub fn new(
        mode: OutputMode,
        params: LaunchParameters,
        origin: Vec3,
        sink: Option<Arc<dyn ShotSink>>,
    ) -> Self {
        Self {
            mode,
            params,
            origin,
            sink,
            report: None,
            impacts: 0,
        }
    }

    /// Latest report text (report mode only).
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn impacts(&self) -> u32 {
        self.impacts
    }
}

impl ImpactHandler for ShotOutput {
    fn on_impact(&mut self, impact: &ImpactResult) {
        self.impacts += 1;
        match self.mode {
            OutputMode::Report => {
                let text = report::format_report(impact);
                info!("\n{text}");
                self.report = Some(text);
            }
            OutputMode::ShotRecord => {
                let shot = ShotResult::from_impact(&self.params, impact, self.origin);
                match &self.sink {
                    Some(sink) => sink.submit(shot),
                    None => warn!(?shot, "no shot sink configured; shot dropped"),
                }
            }
        }
    }
}

/// Status text before the first shot.
pub const READY_STATUS: &str = "Ready to fire.";

pub struct CannonController {
    pub controls: LauncherControls,
    launch_mode: LaunchMode,
    output: OutputMode,
    classifier: ImpactClassifier,
    spawn_point: Option<Transform>,
    template: Option<ProjectileTemplate>,
    barrel: Option<hecs::Entity>,
    sink: Option<Arc<dyn ShotSink>>,
    slot: ImpactSlot<ShotOutput>,
    projectile: Option<hecs::Entity>,
    status: String,
}

impl CannonController {
    pub fn new(config: &CannonConfig) -> Self {
        Self {
            controls: LauncherControls::new(config.inputs.into()),
            launch_mode: config.launch_mode,
            output: config.output,
            classifier: ImpactClassifier::new(config.heuristics),
            spawn_point: None,
            template: None,
            barrel: None,
            sink: None,
            slot: ImpactSlot::new(),
            projectile: None,
            status: READY_STATUS.to_owned(),
        }
    }

    pub fn with_spawn_point(mut self, spawn_point: Transform) -> Self {
        self.spawn_point = Some(spawn_point);
        self
    }

    pub fn with_template(mut self, template: ProjectileTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_barrel(mut self, barrel: hecs::Entity) -> Self {
        self.barrel = Some(barrel);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ShotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output
    }

    pub fn spawn_point(&self) -> Option<&Transform> {
        self.spawn_point.as_ref()
    }

    /// The live projectile, if one has been fired.
    pub fn projectile(&self) -> Option<hecs::Entity> {
        self.projectile
    }

    /// Text shown in the launcher's report label.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Aim segment from the spawn point for the current angle.
    pub fn aim_line(&self, length: f32) -> Option<(Vec3, Vec3)> {
        let spawn = self.spawn_point.as_ref()?;
        let angle = self.controls.parameters().angle;
        Some(launch::aim_line(spawn.position, angle, spawn.up(), length))
    }

    /// Spawn and launch a new projectile, replacing the previous one.
    pub fn fire(&mut self, world: &mut hecs::World, now: f64) -> Result<hecs::Entity, FireError> {
        let (spawn, collider, mut body) = match self.validate() {
            Ok(parts) => parts,
            Err(err) => {
                match err {
                    FireError::MissingRigidBody => error!("{err}"),
                    _ => warn!("{err}; not firing"),
                }
                return Err(err);
            }
        };

        self.slot.unsubscribe();
        if let Some(old) = self.projectile.take() {
            if world.despawn(old).is_ok() {
                debug!(?old, "previous projectile despawned");
            }
        }

        let params = self.controls.parameters();
        let vector = launch::launch_vector(&params, spawn.up());
        launch::apply_launch(&mut body, &params, vector, self.launch_mode);

        let entity = world.spawn((
            Transform::from_position(spawn.position),
            body,
            collider,
            BodyCategory::Projectile,
            ProjectileTracker { launch_time: now },
        ));

        let output = ShotOutput::new(self.output, params, spawn.position, self.sink.clone());
        self.slot.subscribe(entity, output);
        self.projectile = Some(entity);

        self.status = report::fire_summary(&params);
        info!(?entity, ?vector, "{}", self.status);
        Ok(entity)
    }

    fn validate(&self) -> Result<(Transform, Collider, RigidBody), FireError> {
        let template = self.template.as_ref().ok_or(FireError::MissingTemplate)?;
        let spawn = self.spawn_point.ok_or(FireError::MissingSpawnPoint)?;
        let body = template.body.clone().ok_or(FireError::MissingRigidBody)?;
        Ok((spawn, template.collider, body))
    }

    /// Classify the current projectile's collisions and deliver the results.
    ///
    /// Returns the impacts that reached the output handler.
    pub fn handle_collisions(
        &mut self,
        world: &hecs::World,
        events: &[CollisionEvent],
        now: f64,
    ) -> Vec<ImpactResult> {
        let Some(projectile) = self.projectile else {
            return Vec::new();
        };

        let mut delivered = Vec::new();
        for event in events.iter().filter(|e| e.entity == projectile) {
            let Ok(tracker) = world.get::<&ProjectileTracker>(projectile) else {
                warn!(?projectile, "projectile has no tracker; impact ignored");
                continue;
            };
            let launch_time = tracker.launch_time;
            drop(tracker);

            let position = world
                .get::<&Transform>(projectile)
                .map(|t| t.position)
                .unwrap_or(Vec3::ZERO);

            let Some(impact) = self
                .classifier
                .classify(&event.collision, launch_time, now, position)
            else {
                continue;
            };

            if self.slot.deliver(projectile, &impact) {
                delivered.push(impact);
            }
        }

        if let Some(text) = self.slot.handler().and_then(ShotOutput::report) {
            if !delivered.is_empty() {
                self.status = text.to_owned();
            }
        }
        delivered
    }

    /// Mirror the aim angle onto the barrel entity.
    pub fn update(&mut self, world: &mut hecs::World) {
        let Some(barrel) = self.barrel else {
            return;
        };
        let rotation = launch::barrel_rotation(self.controls.parameters().angle);
        match world.get::<&mut Transform>(barrel) {
            Ok(mut transform) => transform.rotation = rotation,
            Err(_) => debug!(?barrel, "barrel has no transform"),
        }
    }

    /// Fallen structure pieces around the live projectile.
    pub fn pieces_down_nearby(&self, world: &hecs::World) -> u32 {
        let Some(projectile) = self.projectile else {
            return 0;
        };
        match world.get::<&Transform>(projectile) {
            Ok(transform) => self.classifier.count_fallen_nearby(world, transform.position),
            Err(_) => 0,
        }
    }
}

/// Spawn a barrel entity at `position`.
pub fn spawn_barrel(world: &mut hecs::World, position: Vec3) -> hecs::Entity {
    world.spawn((Transform::from_position(position), Barrel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::ecs::components::physics::{ForceMode, SleepInfo};
    use crate::physics::contact::{Collision, ContactPoint};
    use crate::physics::{PhysicsConfig, PhysicsWorld};

    type BoxedHandler = Box<dyn FnMut(&ImpactResult)>;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<ShotResult>>);

    impl ShotSink for RecordingSink {
        fn submit(&self, shot: ShotResult) {
            self.0.lock().unwrap().push(shot);
        }
    }

    fn controller() -> CannonController {
        CannonController::new(&CannonConfig::default())
            .with_spawn_point(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .with_template(ProjectileTemplate::ball(0.2))
    }

    fn hit_event(projectile: hecs::Entity, piece: hecs::Entity) -> CollisionEvent {
        CollisionEvent {
            entity: projectile,
            collision: Collision {
                other: piece,
                other_category: BodyCategory::StructurePiece,
                contacts: vec![ContactPoint {
                    position: Vec3::new(3.0, 1.0, 0.0),
                    body: Some(piece),
                }],
                relative_velocity: Vec3::new(-4.0, 0.0, 0.0),
                impulse: Vec3::new(-1.2, 0.0, 0.0),
            },
        }
    }

    #[test]
    fn test_slot_only_delivers_to_subscriber() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let impact = ImpactResult {
            time_of_flight: 1.0,
            impact_point: Vec3::ZERO,
            relative_speed: 0.0,
            collision_impulse: 0.0,
            pieces_down: 1,
        };

        let mut calls = 0;
        {
            let mut slot = ImpactSlot::new();
            slot.subscribe(a, |_: &ImpactResult| calls += 1);
            assert!(slot.deliver(a, &impact));
            assert!(!slot.deliver(b, &impact));
            slot.unsubscribe();
            assert!(!slot.deliver(a, &impact));
            assert_eq!(slot.subscriber(), None);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_subscribe_replaces_previous_handler() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let mut slot: ImpactSlot<BoxedHandler> = ImpactSlot::new();
        assert!(slot.subscribe(a, Box::new(|_: &ImpactResult| {})).is_none());
        assert!(slot.subscribe(b, Box::new(|_: &ImpactResult| {})).is_some());
        assert_eq!(slot.subscriber(), Some(b));
    }

    #[test]
    fn test_fire_spawns_launched_projectile() {
        assert_eq!(controller().status(), "Ready to fire.");
        let mut world = hecs::World::new();
        let mut controller = controller();
        controller.controls.angle.set_slider(90.0);
        controller.controls.force.set_slider(6.0);
        controller.controls.mass.set_slider(2.0);

        let entity = controller.fire(&mut world, 3.0).unwrap();

        let body = world.get::<&RigidBody>(entity).unwrap();
        assert_eq!(body.mass, 2.0);
        assert!((body.linear_velocity - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-4);
        assert_eq!(world.get::<&ProjectileTracker>(entity).unwrap().launch_time, 3.0);
        assert_eq!(
            world.get::<&Transform>(entity).unwrap().position,
            Vec3::new(0.0, 1.0, 0.0)
        );
        assert_eq!(controller.status(), "Fired: angle=90.0°, force=6.0, mass=2.00kg");
    }

    #[test]
    fn test_missing_references_have_no_side_effects() {
        let mut world = hecs::World::new();

        let mut no_template = CannonController::new(&CannonConfig::default())
            .with_spawn_point(Transform::identity());
        assert_eq!(
            no_template.fire(&mut world, 0.0),
            Err(FireError::MissingTemplate)
        );

        let mut no_spawn = CannonController::new(&CannonConfig::default())
            .with_template(ProjectileTemplate::ball(0.2));
        assert_eq!(no_spawn.fire(&mut world, 0.0), Err(FireError::MissingSpawnPoint));

        let mut no_body = CannonController::new(&CannonConfig::default())
            .with_spawn_point(Transform::identity())
            .with_template(ProjectileTemplate {
                collider: Collider::sphere(0.2),
                body: None,
            });
        assert_eq!(no_body.fire(&mut world, 0.0), Err(FireError::MissingRigidBody));

        assert_eq!(world.len(), 0);
        assert!(no_body.projectile().is_none());
        assert_eq!(no_body.status(), READY_STATUS);
    }

    #[test]
    fn test_refire_replaces_projectile_and_subscription() {
        let mut world = hecs::World::new();
        let piece = world.spawn(());
        let mut controller = controller();

        let first = controller.fire(&mut world, 0.0).unwrap();
        let second = controller.fire(&mut world, 1.0).unwrap();
        assert!(!world.contains(first));
        assert!(world.contains(second));

        // A late event from the destroyed projectile is ignored.
        let stale = controller.handle_collisions(&world, &[hit_event(first, piece)], 1.5);
        assert!(stale.is_empty());

        let delivered = controller.handle_collisions(&world, &[hit_event(second, piece)], 1.5);
        assert_eq!(delivered.len(), 1);
        assert!((delivered[0].time_of_flight - 0.5).abs() < 1e-6);
        assert_eq!(controller.slot.handler().map(ShotOutput::impacts), Some(1));
    }

    #[test]
    fn test_report_mode_updates_status() {
        let mut world = hecs::World::new();
        let piece = world.spawn(());
        let mut controller = controller();
        let projectile = controller.fire(&mut world, 0.0).unwrap();

        controller.handle_collisions(&world, &[hit_event(projectile, piece)], 2.0);
        assert!(controller.status().starts_with("--- Shot report ---"));
        assert!(controller.status().contains("Pieces down: 1"));
        assert!(controller.status().contains("Score: 112"));
    }

    #[test]
    fn test_non_structure_hits_are_not_reported() {
        let mut world = hecs::World::new();
        let ground = world.spawn(());
        let mut controller = controller();
        let projectile = controller.fire(&mut world, 0.0).unwrap();

        let mut event = hit_event(projectile, ground);
        event.collision.other_category = BodyCategory::Ground;
        assert!(controller.handle_collisions(&world, &[event], 1.0).is_empty());
        assert!(controller.status().starts_with("Fired:"));
    }

    #[test]
    fn test_shot_record_mode_submits_to_sink() {
        let mut world = hecs::World::new();
        let piece = world.spawn(());
        let sink = Arc::new(RecordingSink::default());
        let mut controller = controller().with_sink(sink.clone());
        controller.set_output_mode(OutputMode::ShotRecord);
        let projectile = controller.fire(&mut world, 0.0).unwrap();

        controller.handle_collisions(&world, &[hit_event(projectile, piece)], 1.0);

        let shots = sink.0.lock().unwrap();
        assert_eq!(shots.len(), 1);
        assert!(shots[0].hit);
        assert_eq!(shots[0].affected, 1);
        assert_eq!(shots[0].angle, 45.0);
        // (3, 1, 0) from a spawn point at (0, 1, 0)
        assert!((shots[0].distance - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_shot_record_without_sink_is_dropped() {
        let mut world = hecs::World::new();
        let piece = world.spawn(());
        let mut controller = controller();
        controller.set_output_mode(OutputMode::ShotRecord);
        let projectile = controller.fire(&mut world, 0.0).unwrap();

        let delivered = controller.handle_collisions(&world, &[hit_event(projectile, piece)], 1.0);
        assert_eq!(delivered.len(), 1);
        assert!(controller.status().starts_with("Fired:"));
    }

    #[test]
    fn test_update_rotates_barrel() {
        let mut world = hecs::World::new();
        let barrel = spawn_barrel(&mut world, Vec3::ZERO);
        let mut controller = controller().with_barrel(barrel);
        controller.controls.angle.set_slider(90.0);
        controller.update(&mut world);

        let up = world.get::<&Transform>(barrel).unwrap().up();
        assert!((up - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_aim_line_follows_angle() {
        let mut controller = controller();
        controller.controls.angle.set_slider(0.0);
        let (start, end) = controller.aim_line(3.0).unwrap();
        assert_eq!(start, Vec3::new(0.0, 1.0, 0.0));
        assert!((end - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_shot_knocks_over_stacked_piece() {
        let mut world = hecs::World::new();
        let piece = world.spawn((
            Transform::from_position(Vec3::new(2.0, 1.0, 0.0)),
            RigidBody::new_dynamic(1.0),
            Collider::cuboid(Vec3::splat(0.25)),
            BodyCategory::StructurePiece,
            SleepInfo::asleep(),
        ));

        let config = CannonConfig {
            launch_mode: LaunchMode::AddForce(ForceMode::VelocityChange),
            ..CannonConfig::default()
        };
        let mut controller = CannonController::new(&config)
            .with_spawn_point(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
            .with_template(ProjectileTemplate::ball(0.2));
        controller.controls.angle.set_slider(90.0);
        controller.controls.force.set_slider(10.0);

        let mut physics = PhysicsWorld::new(PhysicsConfig {
            gravity: Vec3::ZERO,
            ..PhysicsConfig::default()
        });
        controller.fire(&mut world, 0.0).unwrap();

        let mut now = 0.0;
        let mut impacts = Vec::new();
        for _ in 0..60 {
            now += 1.0 / 60.0;
            let events = physics.step(&mut world, 1.0 / 60.0);
            impacts.extend(controller.handle_collisions(&world, &events, now));
        }

        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].pieces_down, 1);
        assert!(impacts[0].time_of_flight > 0.1 && impacts[0].time_of_flight < 0.3);
        assert!(!world.get::<&SleepInfo>(piece).unwrap().is_sleeping());
        assert!(world.get::<&RigidBody>(piece).unwrap().linear_velocity.x > 0.0);
    }

    #[test]
    fn test_resting_ball_reports_one_impact() {
        let mut world = hecs::World::new();
        world.spawn((
            Transform::from_position(Vec3::ZERO),
            RigidBody::new_static(),
            Collider::cuboid(Vec3::new(2.0, 0.25, 2.0)),
            BodyCategory::StructurePiece,
        ));

        let mut controller = controller();
        controller.controls.force.set_slider(0.0);
        let mut physics = PhysicsWorld::new(PhysicsConfig::default());
        let projectile = controller.fire(&mut world, 0.0).unwrap();

        let mut now = 0.0;
        let mut impacts = 0;
        for _ in 0..180 {
            now += 1.0 / 60.0;
            let events = physics.step(&mut world, 1.0 / 60.0);
            impacts += controller.handle_collisions(&world, &events, now).len();
        }

        assert_eq!(impacts, 1);
        assert_eq!(controller.slot.handler().map(ShotOutput::impacts), Some(1));
        let rb = world.get::<&RigidBody>(projectile).unwrap();
        assert!(rb.linear_velocity.y.abs() < 0.5, "vy = {}", rb.linear_velocity.y);
    }
}
