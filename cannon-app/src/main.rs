mod scene;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use cannon::{
    CannonConfig, CannonController, PhysicsConfig, PhysicsWorld, ProjectileTemplate, ShotResult,
    ShotSink, ShotStore, StoreError,
};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

const FRAME_DT: f64 = 1.0 / 60.0;
const SIM_SECONDS: f64 = 4.0;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn load_config() -> anyhow::Result<CannonConfig> {
    match std::env::var("CANNON_CONFIG") {
        Ok(path) => CannonConfig::load(&path),
        Err(_) => Ok(CannonConfig::default()),
    }
}

/// Store wrapper that keeps submitted requests so the demo can wait for them.
struct PendingStore {
    store: ShotStore,
    pending: Mutex<Vec<JoinHandle<Result<String, StoreError>>>>,
}

impl PendingStore {
    async fn flush(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in handles {
            // Outcomes are already logged by the store.
            let _ = handle.await;
        }
    }
}

impl ShotSink for PendingStore {
    fn submit(&self, shot: ShotResult) {
        let Some(handle) = self.store.save_shot(shot) else {
            return;
        };
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(handle);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = load_config()?;
    let mut world = hecs::World::new();
    let scene = scene::build(&mut world, 5.5, 3, 6);
    tracing::info!(pieces = scene.pieces.len(), "scene ready");

    let store = if config.persistence_enabled() {
        let timeout = config.request_timeout();
        let store = ShotStore::new(config.base_url.clone(), timeout, Handle::current())
            .context("failed to build shot store")?;
        Some(Arc::new(PendingStore {
            store,
            pending: Mutex::new(Vec::new()),
        }))
    } else {
        None
    };

    let mut controller = CannonController::new(&config)
        .with_spawn_point(scene.spawn_point)
        .with_template(ProjectileTemplate::ball(0.2))
        .with_barrel(scene.barrel);
    if let Some(store) = &store {
        controller = controller.with_sink(store.clone());
    }

    controller.update(&mut world);
    if let Some((from, to)) = controller.aim_line(3.0) {
        tracing::debug!(?from, ?to, "aim");
    }

    let mut physics = PhysicsWorld::new(PhysicsConfig::default());
    let mut now = 0.0;
    controller.fire(&mut world, now)?;

    let mut impacts = 0;
    while now < SIM_SECONDS {
        now += FRAME_DT;
        let events = physics.step(&mut world, FRAME_DT);
        impacts += controller.handle_collisions(&world, &events, now).len();
        controller.update(&mut world);
    }

    tracing::info!(
        impacts,
        fallen_nearby = controller.pieces_down_nearby(&world),
        "simulation finished"
    );
    println!("{}", controller.status());

    if let Some(store) = store {
        store.flush().await;

        let (tx, rx) = oneshot::channel();
        if let Some(handle) = store.store.get_shots(move |body| {
            let _ = tx.send(body);
        }) {
            let _ = handle.await;
        }
        match rx.await {
            Ok(Some(body)) => tracing::info!(bytes = body.len(), "stored shots fetched"),
            _ => tracing::warn!("stored shots unavailable"),
        }
    }

    Ok(())
}
