//! Game setup configuration
//!
//! Chosen on the setup screen and persisted as JSON between sessions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::GridSize;
pub use crate::sim::GameMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

/// Setup values for a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    /// Ticks per second
    pub frames_per_second: u32,
    pub mode: GameMode,
    /// RNG seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            frames_per_second: DEFAULT_FPS,
            mode: GameMode::Single,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn with_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn grid(&self) -> GridSize {
        GridSize::new(self.grid_width as i32, self.grid_height as i32)
    }

    /// Time between ticks (`1000ms / fps`, rounded)
    pub fn tick_interval(&self) -> Duration {
        let fps = self.frames_per_second.clamp(MIN_FPS, MAX_FPS);
        let millis = (1000.0 / fps as f64).round() as u64;
        Duration::from_millis(millis)
    }

    /// Copy with every value pulled into its allowed range
    pub fn clamped(&self) -> Self {
        Self {
            grid_width: self.grid_width.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            grid_height: self.grid_height.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            frames_per_second: self.frames_per_second.clamp(MIN_FPS, MAX_FPS),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("grid_width", self.grid_width, MIN_GRID_SIZE, MAX_GRID_SIZE)?;
        check_range("grid_height", self.grid_height, MIN_GRID_SIZE, MAX_GRID_SIZE)?;
        check_range("frames_per_second", self.frames_per_second, MIN_FPS, MAX_FPS)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Config saved to {}", path.as_ref().display());
        Ok(())
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
