//! Player input
//!
//! Keys become [`Intent`]s; intents stage changes on a [`GameState`]. Nothing
//! here moves a player or resolves a collision, that only happens in
//! [`step`](super::tick::step).

use serde::{Deserialize, Serialize};

use super::grid::{Direction, is_valid_direction_change};
use super::state::{Bullet, GameEvent, GameMode, GameState};

/// A key press from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Space,
    Char(char),
}

/// What a key press asks the game to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Steer { player: u8, direction: Direction },
    Shoot { player: u8 },
    DeployNeutron { player: u8 },
    TogglePause,
}

impl Intent {
    /// Shoot and deploy wait for the next tick; steering and pause apply at once
    pub fn is_one_shot(&self) -> bool {
        matches!(self, Intent::Shoot { .. } | Intent::DeployNeutron { .. })
    }
}

fn arrow_direction(key: Key) -> Option<Direction> {
    match key {
        Key::ArrowUp => Some(Direction::Up),
        Key::ArrowDown => Some(Direction::Down),
        Key::ArrowLeft => Some(Direction::Left),
        Key::ArrowRight => Some(Direction::Right),
        _ => None,
    }
}

fn wasd_direction(key: Key) -> Option<Direction> {
    match key {
        Key::Char(c) => match c.to_ascii_lowercase() {
            'w' => Some(Direction::Up),
            's' => Some(Direction::Down),
            'a' => Some(Direction::Left),
            'd' => Some(Direction::Right),
            _ => None,
        },
        _ => None,
    }
}

/// Map a key to an intent for the given mode.
///
/// Single-player: arrows steer, `1` shoots, `2` deploys a NeuTron bomb.
/// Two-player: WASD and `1` for player 1, arrows and `/` for player 2.
/// Space pauses in both.
pub fn translate_key(mode: GameMode, key: Key) -> Option<Intent> {
    if key == Key::Space {
        return Some(Intent::TogglePause);
    }

    match mode {
        GameMode::Single => {
            if let Some(direction) = arrow_direction(key) {
                return Some(Intent::Steer {
                    player: 1,
                    direction,
                });
            }
            match key {
                Key::Char('1') => Some(Intent::Shoot { player: 1 }),
                Key::Char('2') => Some(Intent::DeployNeutron { player: 1 }),
                _ => None,
            }
        }
        GameMode::Two => {
            if let Some(direction) = wasd_direction(key) {
                return Some(Intent::Steer {
                    player: 1,
                    direction,
                });
            }
            if let Some(direction) = arrow_direction(key) {
                return Some(Intent::Steer {
                    player: 2,
                    direction,
                });
            }
            match key {
                Key::Char('1') => Some(Intent::Shoot { player: 1 }),
                Key::Char('/') => Some(Intent::Shoot { player: 2 }),
                _ => None,
            }
        }
    }
}

/// Stage a new heading. Reversals and dead players are ignored.
pub fn steer(state: &mut GameState, player: u8, direction: Direction) -> bool {
    match state.player_mut(player) {
        Some(p) if p.is_alive && is_valid_direction_change(p.direction, direction) => {
            p.pending_direction = direction;
            true
        }
        _ => false,
    }
}

/// Fire a bullet from the player's head if they have ammo
pub fn shoot(state: &mut GameState, player: u8) -> bool {
    let Some(p) = state.player_mut(player) else {
        return false;
    };
    if !p.is_alive || p.bullets == 0 {
        return false;
    }

    p.bullets -= 1;
    let bullet = Bullet {
        position: p.position,
        direction: p.direction,
        owner: p.id,
        active: true,
    };
    state.bullets.push(bullet);
    state.events.push(GameEvent::BulletFired { player });
    true
}

/// Spend a NeuTron bomb: clears the player's trail and adds a token
pub fn deploy_neutron(state: &mut GameState, player: u8) -> bool {
    if state.mode != GameMode::Single {
        return false;
    }
    let Some(p) = state.player_mut(player) else {
        return false;
    };
    if !p.is_alive || p.neutron_bombs == 0 {
        return false;
    }

    p.neutron_bombs -= 1;
    p.trail.clear();
    state.spawn_token();
    state.events.push(GameEvent::NeutronDeployed { player });
    log::debug!("Player {} deployed a NeuTron bomb", player);
    true
}

/// Flip the pause flag unless the round is over
pub fn toggle_pause(state: &mut GameState) -> bool {
    if state.is_game_over {
        return false;
    }
    state.is_game_paused = !state.is_game_paused;
    true
}

/// Apply any intent. Returns whether it changed the state.
pub fn apply_intent(state: &mut GameState, intent: Intent) -> bool {
    match intent {
        Intent::Steer { player, direction } => steer(state, player, direction),
        Intent::Shoot { player } => shoot(state, player),
        Intent::DeployNeutron { player } => deploy_neutron(state, player),
        Intent::TogglePause => toggle_pause(state),
    }
}
