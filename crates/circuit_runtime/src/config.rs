//! Runtime Configuration
//!
//! Settings for the headless host. Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. Config file: `circuit.toml` in the working directory
//! 3. Environment variables: `CIRCUIT_DURATION`, `CIRCUIT_FPS`,
//!    `CIRCUIT_CAMERA`, `CIRCUIT_SHOW_FPS`
//!
//! # Example Config File
//!
//! ```toml
//! duration_secs = 30.0
//! target_fps = 60
//! show_fps = true
//! camera_mode = "third-person"
//!
//! [[script]]
//! at = 0.0
//! code = "KeyW"
//! pressed = true
//! ```

use crate::headless::{default_script, ScriptEvent};
use circuit_game::{CameraMode, GameConfig, GameError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "circuit.toml";

/// Host failures
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid setting {key}={value}")]
    InvalidSetting { key: &'static str, value: String },

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Complete runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Stop after this many seconds of wall time; zero or less runs until Ctrl+C
    pub duration_secs: f32,
    /// Frame pacing target
    pub target_fps: u32,
    /// Log the frame rate once per second
    pub show_fps: bool,
    pub camera_mode: CameraMode,
    /// Input timeline replayed into the session
    pub script: Vec<ScriptEvent>,
    /// Where the file settings came from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            duration_secs: 20.0,
            target_fps: 60,
            show_fps: true,
            camera_mode: CameraMode::ThirdPerson,
            script: default_script(),
            config_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Load from all sources
    pub fn load() -> Result<Self, RuntimeError> {
        let path = Path::new(CONFIG_FILE);
        let mut config = if path.exists() {
            let loaded = Self::load_from_file(path)?;
            log::info!("Loaded runtime config from {}", path.display());
            loaded
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, RuntimeError> {
        Ok(toml::from_str(content)?)
    }

    /// Override with `CIRCUIT_*` variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CIRCUIT_DURATION") {
            self.duration_secs = value.trim().parse().map_err(|_| RuntimeError::InvalidSetting {
                key: "CIRCUIT_DURATION",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("CIRCUIT_FPS") {
            self.target_fps = value.trim().parse().map_err(|_| RuntimeError::InvalidSetting {
                key: "CIRCUIT_FPS",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("CIRCUIT_CAMERA") {
            self.camera_mode = value.parse()?;
            log::info!("Camera mode from env: {}", self.camera_mode);
        }

        if let Some(value) = lookup("CIRCUIT_SHOW_FPS") {
            self.show_fps = matches!(value.trim(), "1" | "true" | "yes" | "on");
        }

        Ok(())
    }

    /// Reject settings the host cannot run with
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.target_fps == 0 {
            return Err(RuntimeError::InvalidSetting {
                key: "target_fps",
                value: self.target_fps.to_string(),
            });
        }
        if !self.duration_secs.is_finite() {
            return Err(RuntimeError::InvalidSetting {
                key: "duration_secs",
                value: self.duration_secs.to_string(),
            });
        }
        Ok(())
    }

    /// Session settings derived from this config
    pub fn game_config(&self) -> GameConfig {
        GameConfig::default()
            .with_camera_mode(self.camera_mode)
            .with_show_fps(self.show_fps)
    }

    pub fn print_summary(&self) {
        log::info!("Runtime Configuration:");
        if self.duration_secs > 0.0 {
            log::info!("  Duration: {:.1}s", self.duration_secs);
        } else {
            log::info!("  Duration: until Ctrl+C");
        }
        log::info!("  Target FPS: {}, FPS log: {}", self.target_fps, self.show_fps);
        log::info!("  Camera: {}", self.camera_mode);
        log::info!("  Script: {} events", self.script.len());
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path.display());
        }
    }
}
