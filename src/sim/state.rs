//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives in [`GameState`], including the
//! seeded RNG, so the tick engine stays a pure function of its input.

use std::collections::HashSet;

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::{Direction, GridSize, Position, random_unoccupied_position};
use crate::consts::*;

/// Single-player survival or two-player head-to-head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Single,
    Two,
}

impl GameMode {
    pub fn player_count(self) -> usize {
        match self {
            GameMode::Single => 1,
            GameMode::Two => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Single => "single",
            GameMode::Two => "two",
        }
    }
}

/// A light cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// 1-based player id
    pub id: u8,
    pub position: Position,
    pub direction: Direction,
    /// Direction applied on the next tick
    pub pending_direction: Direction,
    /// Cells left behind, oldest first. Never contains `position`.
    pub trail: Vec<Position>,
    pub is_alive: bool,
    pub bullets: u32,
    pub neutron_bombs: u32,
    pub hydrotrons_collected: u32,
    /// Rounds won (two-player)
    pub score: u32,
}

impl Player {
    pub fn new(id: u8, position: Position, direction: Direction) -> Self {
        Self {
            id,
            position,
            direction,
            pending_direction: direction,
            trail: Vec::new(),
            is_alive: true,
            bullets: 0,
            neutron_bombs: 0,
            hydrotrons_collected: 0,
            score: 0,
        }
    }

    /// Head or trail covers `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.position == pos || self.trail.contains(&pos)
    }
}

/// Bullet pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub position: Position,
    pub collected: bool,
}

impl Token {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            collected: false,
        }
    }
}

/// A fired projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bullet {
    pub position: Position,
    pub direction: Direction,
    pub owner: u8,
    pub active: bool,
}

/// NeuTron pickup (the purple bullet). At most one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeutronPickup {
    pub position: Position,
    pub collected: bool,
}

/// HydroTron pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydroTron {
    pub position: Position,
    pub collected: bool,
}

/// The GraviTron hazard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraviTron {
    pub position: Position,
    pub collected: bool,
    pub active: bool,
}

/// Something that happened during the last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    TokenCollected { player: u8 },
    NeutronSpawned { position: Position },
    NeutronCollected { player: u8 },
    NeutronDeployed { player: u8 },
    HydroTronSpawned { position: Position },
    HydroTronCollected { player: u8 },
    GraviTronSpawned { position: Position },
    GraviTronEvaded { to: Position },
    GraviTronCollected { player: u8 },
    BulletFired { player: u8 },
    TrailCut { player: u8, removed: usize },
    PlayerDied { player: u8 },
    RoundOver { winner: Option<u8> },
}

/// Complete round state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub mode: GameMode,
    pub grid: GridSize,
    /// Players in index order (id 1 first)
    pub players: Vec<Player>,
    pub tokens: Vec<Token>,
    pub bullets: Vec<Bullet>,
    pub neutron: Option<NeutronPickup>,
    pub hydrotrons: Vec<HydroTron>,
    pub gravitron: Option<GraviTron>,
    /// Set while an uncollected GraviTron is on the grid (presentation only)
    pub gravitron_active: bool,
    /// Terminal "heat death": the GraviTron was collected
    pub gravitron_death: bool,
    pub is_game_over: bool,
    pub is_game_paused: bool,
    pub winner: Option<u8>,
    /// 1-based round number
    pub round: u32,
    /// Tokens collected this round (single-player)
    pub tokens_collected: u32,
    /// Ticks simulated this round
    pub time_ticks: u64,
    /// Run seed
    pub seed: u64,
    pub rng: Pcg32,
    /// Events from the most recent tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a fresh round-1 state
    pub fn new(mode: GameMode, grid: GridSize, seed: u64) -> Self {
        let mut state = Self {
            mode,
            grid,
            players: spawn_players(mode, grid),
            tokens: Vec::with_capacity(INITIAL_TOKEN_COUNT),
            bullets: Vec::new(),
            neutron: None,
            hydrotrons: Vec::new(),
            gravitron: None,
            gravitron_active: false,
            gravitron_death: false,
            is_game_over: false,
            is_game_paused: false,
            winner: None,
            round: 1,
            tokens_collected: 0,
            time_ticks: 0,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        };

        for _ in 0..INITIAL_TOKEN_COUNT {
            state.spawn_token();
        }

        state
    }

    /// Build the next round's state.
    ///
    /// Positions, trails and pickups start over. Scores carry over; in
    /// single-player mode the bomb and HydroTron tallies do too. The RNG
    /// stream continues so consecutive rounds differ.
    pub fn next_round(&self) -> Self {
        let mut players = spawn_players(self.mode, self.grid);
        for (fresh, old) in players.iter_mut().zip(&self.players) {
            fresh.score = old.score;
            if self.mode == GameMode::Single {
                fresh.neutron_bombs = old.neutron_bombs;
                fresh.hydrotrons_collected = old.hydrotrons_collected;
            }
        }

        let mut state = Self {
            mode: self.mode,
            grid: self.grid,
            players,
            tokens: Vec::with_capacity(INITIAL_TOKEN_COUNT),
            bullets: Vec::new(),
            neutron: None,
            hydrotrons: Vec::new(),
            gravitron: None,
            gravitron_active: false,
            gravitron_death: false,
            is_game_over: false,
            is_game_paused: false,
            winner: None,
            round: self.round + 1,
            tokens_collected: 0,
            time_ticks: 0,
            seed: self.seed,
            rng: self.rng.clone(),
            events: Vec::new(),
        };

        for _ in 0..INITIAL_TOKEN_COUNT {
            state.spawn_token();
        }

        state
    }

    pub fn player(&self, id: u8) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: u8) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive).count()
    }

    /// Cells a new pickup must avoid: player heads and trails plus every
    /// live pickup.
    pub fn occupied_cells(&self) -> HashSet<Position> {
        let mut cells = HashSet::new();
        for player in &self.players {
            cells.insert(player.position);
            cells.extend(player.trail.iter().copied());
        }
        cells.extend(self.tokens.iter().filter(|t| !t.collected).map(|t| t.position));
        cells.extend(
            self.hydrotrons
                .iter()
                .filter(|h| !h.collected)
                .map(|h| h.position),
        );
        if let Some(neutron) = self.neutron.filter(|n| !n.collected) {
            cells.insert(neutron.position);
        }
        if let Some(gravitron) = self.gravitron.filter(|g| !g.collected) {
            cells.insert(gravitron.position);
        }
        cells
    }

    /// Sample a free cell for a new pickup
    pub fn free_cell(&mut self) -> Option<Position> {
        let occupied = self.occupied_cells();
        let cell = random_unoccupied_position(&mut self.rng, self.grid, &occupied);
        if cell.is_none() {
            log::warn!("No free cell left on {}x{} grid", self.grid.width, self.grid.height);
        }
        cell
    }

    /// Place one token on a free cell
    pub fn spawn_token(&mut self) -> bool {
        match self.free_cell() {
            Some(position) => {
                self.tokens.push(Token::new(position));
                true
            }
            None => false,
        }
    }

    pub fn spawn_hydrotron(&mut self) -> bool {
        match self.free_cell() {
            Some(position) => {
                self.hydrotrons.push(HydroTron {
                    position,
                    collected: false,
                });
                self.events.push(GameEvent::HydroTronSpawned { position });
                true
            }
            None => false,
        }
    }

    pub fn spawn_neutron(&mut self) -> bool {
        match self.free_cell() {
            Some(position) => {
                self.neutron = Some(NeutronPickup {
                    position,
                    collected: false,
                });
                self.events.push(GameEvent::NeutronSpawned { position });
                true
            }
            None => false,
        }
    }

    pub fn spawn_gravitron(&mut self) -> bool {
        match self.free_cell() {
            Some(position) => {
                self.gravitron = Some(GraviTron {
                    position,
                    collected: false,
                    active: true,
                });
                self.gravitron_active = true;
                self.events.push(GameEvent::GraviTronSpawned { position });
                true
            }
            None => false,
        }
    }
}

/// Starting players for a mode. Player 1 starts a quarter of the way in
/// heading right; player 2 three quarters in heading left.
pub fn spawn_players(mode: GameMode, grid: GridSize) -> Vec<Player> {
    let mid_y = grid.height / 2;
    let mut players = vec![Player::new(
        1,
        IVec2::new(grid.width / 4, mid_y),
        Direction::Right,
    )];
    if mode == GameMode::Two {
        players.push(Player::new(
            2,
            IVec2::new(grid.width * 3 / 4, mid_y),
            Direction::Left,
        ));
    }
    players
}
