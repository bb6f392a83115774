//! Round and game lifecycle
//!
//! [`GameSession`] owns the current [`GameState`] and decides when it may
//! advance. It knows nothing about timers; see `driver` for that.
//!
//! ```text
//! Setup --start--> Playing <--pause/resume--> Paused
//!                     |
//!                 round ends
//!                     v
//!                 RoundOver --next_round--> Playing
//!
//! any --new_game--> GameReset --configure--> Setup
//!                   GameReset --start------> Playing
//! ```

use serde::{Deserialize, Serialize};

use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::settings::GameConfig;
use crate::sim::input::{self, Intent, Key};
use crate::sim::{GameEvent, GameMode, GameState, step};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Waiting for the player to confirm setup
    Setup,
    Playing,
    Paused,
    /// Round finished, waiting for next round or new game
    RoundOver,
    /// All per-game progress wiped, waiting for setup or start
    GameReset,
}

/// Result of a finished round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: u32,
    pub mode: GameMode,
    /// Winning player id (two-player)
    pub winner: Option<u8>,
    /// Tokens collected this round (single-player score)
    pub tokens_collected: u32,
    pub gravitron_death: bool,
    pub high_score: u32,
    pub new_high_score: bool,
    /// `(player id, rounds won)`
    pub scores: Vec<(u8, u32)>,
}

pub struct GameSession {
    config: GameConfig,
    state: GameState,
    phase: SessionPhase,
    high_score: HighScore,
    /// High score when the round started
    round_start_best: u32,
    store: Box<dyn KeyValueStore>,
    /// Shots and bomb deployments waiting for the next tick
    queued: Vec<Intent>,
}

impl GameSession {
    pub fn new(config: GameConfig, store: Box<dyn KeyValueStore>) -> Self {
        let config = config.clamped();
        let high_score = HighScore::load(store.as_ref());
        let state = fresh_state(&config);
        Self {
            config,
            state,
            phase: SessionPhase::Setup,
            round_start_best: high_score.best(),
            high_score,
            store,
            queued: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Read-only view for rendering
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn high_score(&self) -> u32 {
        self.high_score.best()
    }

    /// Tokens collected so far this round
    pub fn tokens_collected(&self) -> u32 {
        self.state.tokens_collected
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Begin play from setup or after a reset
    pub fn start(&mut self) -> bool {
        match self.phase {
            SessionPhase::Setup | SessionPhase::GameReset => {
                self.phase = SessionPhase::Playing;
                self.round_start_best = self.high_score.best();
                log::info!(
                    "Starting {} player game on {}x{} at {} fps",
                    self.config.mode.as_str(),
                    self.config.grid_width,
                    self.config.grid_height,
                    self.config.frames_per_second
                );
                true
            }
            _ => false,
        }
    }

    /// Handle a key press. Returns whether it did anything.
    pub fn handle_key(&mut self, key: Key) -> bool {
        match input::translate_key(self.config.mode, key) {
            Some(intent) => self.submit_intent(intent),
            None => false,
        }
    }

    /// Steering and pause apply now; shots and bombs wait for the next tick.
    pub fn submit_intent(&mut self, intent: Intent) -> bool {
        if !matches!(self.phase, SessionPhase::Playing | SessionPhase::Paused) {
            return false;
        }

        match intent {
            Intent::TogglePause => self.toggle_pause(),
            _ if intent.is_one_shot() => {
                self.queued.push(intent);
                true
            }
            _ => input::apply_intent(&mut self.state, intent),
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != SessionPhase::Playing || self.state.is_game_over {
            return false;
        }
        self.state.is_game_paused = true;
        self.phase = SessionPhase::Paused;
        log::info!("Game paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != SessionPhase::Paused || self.state.is_game_over {
            return false;
        }
        self.state.is_game_paused = false;
        self.phase = SessionPhase::Playing;
        log::info!("Game resumed");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            SessionPhase::Playing => self.pause(),
            SessionPhase::Paused => self.resume(),
            _ => false,
        }
    }

    /// Advance one tick. Returns a summary when this tick ended the round.
    pub fn tick(&mut self) -> Option<RoundSummary> {
        if self.phase != SessionPhase::Playing {
            return None;
        }

        let mut staged = self.state.clone();
        for intent in self.queued.drain(..) {
            input::apply_intent(&mut staged, intent);
        }
        let staged_events = std::mem::take(&mut staged.events);

        let mut next = step(&staged);
        next.events.splice(0..0, staged_events);
        let tally_before = self.state.tokens_collected;
        self.state = next;

        for event in &self.state.events {
            log::debug!("tick {}: {:?}", self.state.time_ticks, event);
        }

        if self.state.mode == GameMode::Single && self.state.tokens_collected > tally_before {
            self.update_high_score();
        }

        if !self.state.is_game_over {
            return None;
        }

        self.phase = SessionPhase::RoundOver;
        self.queued.clear();
        let summary = self.summary();
        match (summary.mode, summary.winner) {
            (_, _) if summary.gravitron_death => {
                log::info!("Round {} over: heat death by GraviTron", summary.round)
            }
            (GameMode::Two, Some(winner)) => {
                log::info!("Round {} over: player {} wins", summary.round, winner)
            }
            (GameMode::Two, None) => log::info!("Round {} over: draw", summary.round),
            (GameMode::Single, _) => log::info!(
                "Round {} over: {} tokens collected (best {})",
                summary.round,
                summary.tokens_collected,
                summary.high_score
            ),
        }
        Some(summary)
    }

    fn update_high_score(&mut self) {
        if self.high_score.record(self.state.tokens_collected) {
            if let Err(e) = self.high_score.save(self.store.as_mut()) {
                log::warn!("Failed to persist high score: {}", e);
            }
        }
    }

    fn summary(&self) -> RoundSummary {
        let tokens_collected = self.state.tokens_collected;
        RoundSummary {
            round: self.state.round,
            mode: self.state.mode,
            winner: self.state.winner,
            tokens_collected,
            gravitron_death: self.state.gravitron_death,
            high_score: self.high_score.best(),
            new_high_score: self.state.mode == GameMode::Single
                && tokens_collected > self.round_start_best,
            scores: self.state.players.iter().map(|p| (p.id, p.score)).collect(),
        }
    }

    /// Start the next round, keeping scores (and single-player bomb and
    /// HydroTron tallies).
    pub fn next_round(&mut self) -> bool {
        if !matches!(
            self.phase,
            SessionPhase::Playing | SessionPhase::Paused | SessionPhase::RoundOver
        ) {
            return false;
        }
        self.state = self.state.next_round();
        self.queued.clear();
        self.round_start_best = self.high_score.best();
        self.phase = SessionPhase::Playing;
        log::info!("Round {} started", self.state.round);
        true
    }

    /// Throw away all per-game progress
    pub fn new_game(&mut self) {
        self.state = fresh_state(&self.config);
        self.queued.clear();
        self.phase = SessionPhase::GameReset;
        log::info!("New game");
    }

    /// Apply new setup values. Only allowed before play starts.
    pub fn configure(&mut self, config: GameConfig) -> bool {
        if !matches!(self.phase, SessionPhase::Setup | SessionPhase::GameReset) {
            return false;
        }
        self.config = config.clamped();
        self.state = fresh_state(&self.config);
        self.queued.clear();
        self.phase = SessionPhase::Setup;
        true
    }
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("round", &self.state.round)
            .field("high_score", &self.high_score)
            .finish_non_exhaustive()
    }
}

fn fresh_state(config: &GameConfig) -> GameState {
    let seed = config.seed.unwrap_or_else(rand::random);
    GameState::new(config.mode, config.grid(), seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HIGH_SCORE_KEY;
    use crate::persistence::MemoryStore;
    use crate::sim::{Direction, Token};
    use glam::IVec2;

    fn session(mode: GameMode) -> GameSession {
        let config = GameConfig {
            seed: Some(42),
            ..GameConfig::with_mode(mode)
        };
        GameSession::new(config, Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_starts_in_setup_and_ignores_ticks() {
        let mut s = session(GameMode::Single);
        assert_eq!(s.phase(), SessionPhase::Setup);
        assert!(s.tick().is_none());
        assert_eq!(s.state().time_ticks, 0);
        assert!(!s.handle_key(Key::ArrowUp));
    }

    #[test]
    fn test_tick_advances_while_playing() {
        let mut s = session(GameMode::Single);
        assert!(s.start());
        assert!(!s.start());
        s.tick();
        assert_eq!(s.state().time_ticks, 1);
        assert_eq!(s.state().players[0].position, IVec2::new(11, 15));
    }

    #[test]
    fn test_pause_and_resume() {
        let mut s = session(GameMode::Single);
        s.start();
        assert!(s.handle_key(Key::Space));
        assert_eq!(s.phase(), SessionPhase::Paused);
        assert!(s.state().is_game_paused);
        assert!(s.tick().is_none());
        assert_eq!(s.state().time_ticks, 0);

        assert!(s.resume());
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert!(!s.state().is_game_paused);
    }

    #[test]
    fn test_shot_is_queued_until_next_tick() {
        let mut s = session(GameMode::Single);
        s.start();
        s.state.players[0].bullets = 1;

        assert!(s.handle_key(Key::Char('1')));
        assert!(s.state().bullets.is_empty());
        assert_eq!(s.state().players[0].bullets, 1);

        s.tick();
        assert_eq!(s.state().players[0].bullets, 0);
        assert_eq!(s.state().bullets.len(), 1);
        assert!(s.state().events.contains(&GameEvent::BulletFired { player: 1 }));
    }

    #[test]
    fn test_steering_is_staged_immediately() {
        let mut s = session(GameMode::Single);
        s.start();
        assert!(s.handle_key(Key::ArrowDown));
        assert_eq!(s.state().players[0].pending_direction, Direction::Down);
        assert_eq!(s.state().players[0].direction, Direction::Right);
        assert!(!s.handle_key(Key::ArrowLeft));
    }

    #[test]
    fn test_round_over_and_next_round() {
        let mut s = session(GameMode::Two);
        s.start();
        s.state.players[0].position = IVec2::new(0, 3);
        s.state.players[0].direction = Direction::Left;
        s.state.players[0].pending_direction = Direction::Left;

        let summary = s.tick().expect("round ends");
        assert_eq!(s.phase(), SessionPhase::RoundOver);
        assert_eq!(summary.winner, Some(2));
        assert_eq!(summary.scores, vec![(1, 0), (2, 1)]);
        assert!(!s.handle_key(Key::Space));

        assert!(s.next_round());
        assert_eq!(s.phase(), SessionPhase::Playing);
        assert_eq!(s.state().round, 2);
        assert_eq!(s.state().players[1].score, 1);
        assert!(s.state().players.iter().all(|p| p.is_alive));
    }

    #[test]
    fn test_high_score_updates_and_persists_during_round() {
        let mut s = session(GameMode::Single);
        s.start();
        let head = s.state().players[0].position;
        s.state.tokens = vec![Token::new(head)];

        s.tick();
        assert_eq!(s.tokens_collected(), 1);
        assert_eq!(s.high_score(), 1);
        assert_eq!(s.store.get(HIGH_SCORE_KEY).unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_high_score_loaded_from_store() {
        let mut store = MemoryStore::new();
        store.set(HIGH_SCORE_KEY, "9").unwrap();
        let s = GameSession::new(GameConfig::default(), Box::new(store));
        assert_eq!(s.high_score(), 9);
    }

    #[test]
    fn test_new_game_resets_progress() {
        let mut s = session(GameMode::Single);
        s.start();
        s.state.players[0].neutron_bombs = 2;
        s.state.players[0].hydrotrons_collected = 4;
        s.next_round();

        s.new_game();
        assert_eq!(s.phase(), SessionPhase::GameReset);
        assert_eq!(s.state().round, 1);
        assert_eq!(s.state().players[0].neutron_bombs, 0);
        assert_eq!(s.state().players[0].hydrotrons_collected, 0);
        assert!(s.tick().is_none());

        assert!(s.configure(GameConfig {
            grid_width: 30,
            ..GameConfig::with_mode(GameMode::Two)
        }));
        assert_eq!(s.phase(), SessionPhase::Setup);
        assert_eq!(s.state().players.len(), 2);
        assert_eq!(s.state().grid.width, 30);
        assert!(s.start());
    }

    #[test]
    fn test_configure_rejected_mid_game() {
        let mut s = session(GameMode::Single);
        s.start();
        assert!(!s.configure(GameConfig::default()));
        assert_eq!(s.phase(), SessionPhase::Playing);
    }

    #[test]
    fn test_next_round_preserves_single_player_tallies() {
        let mut s = session(GameMode::Single);
        s.start();
        s.state.players[0].neutron_bombs = 2;
        s.state.players[0].hydrotrons_collected = 4;
        s.state.players[0].bullets = 6;
        s.state.tokens_collected = 3;

        assert!(s.next_round());
        let p = &s.state().players[0];
        assert_eq!(p.neutron_bombs, 2);
        assert_eq!(p.hydrotrons_collected, 4);
        assert_eq!(p.bullets, 0);
        assert_eq!(s.tokens_collected(), 0);
    }
}
