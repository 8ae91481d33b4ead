//! Launcher configuration.
//!
//! Everything has a default, so an empty file (or no file at all) yields the
//! stock launcher: impulse launch, report output, no shot store.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::impact::HeuristicConfig;
use crate::launch::{LaunchMode, LaunchParameters};
use crate::report::OutputMode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid launcher config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("request_timeout_secs must be positive, got {0}")]
    InvalidTimeout(f64),
    #[error("check_radius must not be negative, got {0}")]
    InvalidCheckRadius(f32),
}

/// Initial slider positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialInputs {
    pub angle: f32,
    pub force: f32,
    pub mass: f32,
}

impl Default for InitialInputs {
    fn default() -> Self {
        let params = LaunchParameters::default();
        Self {
            angle: params.angle,
            force: params.force,
            mass: params.mass,
        }
    }
}

impl From<InitialInputs> for LaunchParameters {
    fn from(inputs: InitialInputs) -> Self {
        LaunchParameters::new(inputs.angle, inputs.force, inputs.mass)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannonConfig {
    pub launch_mode: LaunchMode,
    pub output: OutputMode,
    pub heuristics: HeuristicConfig,
    pub inputs: InitialInputs,
    /// Shot store collection root. Empty disables persistence.
    pub base_url: String,
    pub request_timeout_secs: f64,
}

impl Default for CannonConfig {
    fn default() -> Self {
        Self {
            launch_mode: LaunchMode::default(),
            output: OutputMode::default(),
            heuristics: HeuristicConfig::default(),
            inputs: InitialInputs::default(),
            base_url: String::new(),
            request_timeout_secs: 10.0,
        }
    }
}

impl CannonConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs <= 0.0 || !self.request_timeout_secs.is_finite() {
            return Err(ConfigError::InvalidTimeout(self.request_timeout_secs));
        }
        if self.heuristics.check_radius < 0.0 {
            return Err(ConfigError::InvalidCheckRadius(self.heuristics.check_radius));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_timeout_secs).unwrap_or(Duration::MAX)
    }

    pub fn persistence_enabled(&self) -> bool {
        !self.base_url.trim().is_empty()
    }
}
