//! Battle Tron - A light-cycle grid combat game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (grid, entities, tick engine, input)
//! - `session`: Round/game lifecycle controller
//! - `scheduler` / `driver`: Fixed-interval tick loop (native only)
//! - `highscores` / `persistence`: High score tracking behind a key/value store
//! - `scoring`: Score submission sink and signed-in user context
//! - `settings`: Setup configuration

pub mod autopilot;
#[cfg(not(target_arch = "wasm32"))]
pub mod driver;
pub mod highscores;
pub mod persistence;
#[cfg(not(target_arch = "wasm32"))]
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod sim;

pub use highscores::HighScore;
pub use session::{GameSession, RoundSummary, SessionPhase};
pub use settings::{GameConfig, GameMode};

/// Game configuration constants
pub mod consts {
    /// Bullets required to spawn a NeuTron pickup
    pub const NEUTRON_BOMB_THRESHOLD: u32 = 10;
    /// NeuTron bombs required per HydroTron
    pub const HYDROTRON_THRESHOLD: u32 = 3;
    /// HydroTrons collected before the GraviTron appears
    pub const GRAVITRON_THRESHOLD: u32 = 5;
    /// Manhattan distance at which the GraviTron starts evading
    pub const GRAVITRON_PROXIMITY_THRESHOLD: i32 = 3;
    /// Bullets needed to keep the GraviTron from evading
    pub const STABILITY_THRESHOLD: u32 = 2;

    /// Grid cells a bullet travels per tick
    pub const BULLET_SPEED: u32 = 2;
    /// Tokens placed at the start of every round
    pub const INITIAL_TOKEN_COUNT: usize = 3;
    /// Tokens spawned when a HydroTron is collected
    pub const HYDROTRON_TOKEN_REWARD: usize = 2;

    /// Random samples before falling back to a full grid scan
    pub const MAX_SPAWN_ATTEMPTS: u32 = 1000;

    /// Setup bounds
    pub const MIN_GRID_SIZE: u32 = 20;
    pub const MAX_GRID_SIZE: u32 = 80;
    pub const MIN_FPS: u32 = 2;
    pub const MAX_FPS: u32 = 200;

    /// Setup defaults
    pub const DEFAULT_GRID_WIDTH: u32 = 40;
    pub const DEFAULT_GRID_HEIGHT: u32 = 30;
    pub const DEFAULT_FPS: u32 = 15;
}
