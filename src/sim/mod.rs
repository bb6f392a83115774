//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One `step` per tick, no wall-clock time
//! - Seeded RNG carried inside the state
//! - Stable iteration order (player index, then pickup type)
//! - No rendering or platform dependencies

pub mod grid;
pub mod input;
pub mod state;
pub mod tick;

pub use grid::{
    Direction, GridSize, Position, is_out_of_bounds, is_valid_direction_change,
    manhattan_distance, positions_equal, random_unoccupied_position,
};
pub use input::{Intent, Key, apply_intent, translate_key};
pub use state::{
    Bullet, GameEvent, GameMode, GameState, GraviTron, HydroTron, NeutronPickup, Player, Token,
};
pub use tick::{cut_trail, step};
