//! Cannon launcher core
//!
//! Fires projectiles at a destructible structure, classifies what they hit
//! and reports the result.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - Components stored in a hecs world (transforms, bodies, colliders)
//! 2. **physics** - Minimal host physics: fixed-step integration and collision-enter events
//! 3. **launch** - Launch parameters, launch vector and body priming
//! 4. **impact** - Impact classification and the fallen-piece gauge
//! 5. **report** - Score, shot report text and persisted shot records
//! 6. **controls** - Slider and text input fields
//! 7. **controller** - Fire / collision / update entry points for a scene
//! 8. **persistence** - Shot sink trait and REST shot store (feature = "persistence")
//! 9. **config** - TOML launcher configuration

pub mod config;
pub mod controls;
pub mod controller;
pub mod ecs;
pub mod impact;
pub mod launch;
pub mod persistence;
pub mod physics;
pub mod report;

// Re-export commonly used types
pub use config::{CannonConfig, ConfigError, InitialInputs};
pub use controls::{InputField, LauncherControls};
pub use controller::{
    CannonController, FireError, ImpactHandler, ImpactSlot, ProjectileTemplate, ShotOutput,
};
pub use impact::{HeuristicConfig, ImpactClassifier, ImpactResult};
pub use launch::{LaunchMode, LaunchParameters};
pub use persistence::ShotSink;
#[cfg(feature = "persistence")]
pub use persistence::{ShotStore, StoreError};
pub use physics::{PhysicsConfig, PhysicsWorld};
pub use report::{OutputMode, ShotResult};

// Re-export dependencies
pub use glam;
pub use hecs;
