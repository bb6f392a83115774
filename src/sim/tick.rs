//! Fixed-interval simulation tick
//!
//! [`step`] advances a round by exactly one tick. The phase order below
//! decides every tie-break, so keep it intact:
//!
//! 1. Pickup availability (single-player): HydroTron top-up, GraviTron,
//!    NeuTron. Spawning a NeuTron ends the tick early.
//! 2. Pickup collection per living player, in player order.
//! 3. Player movement and collisions.
//! 4. Bullet flight and trail cuts.
//! 5. Cleanup of spent entities.
//! 6. Round-over evaluation.

use std::collections::HashSet;

use super::grid::{Position, is_out_of_bounds, manhattan_distance, translate};
use super::state::{GameEvent, GameMode, GameState, Token};
use crate::consts::*;

/// Advance the game by one tick, returning the new state.
///
/// A paused or finished round comes back unchanged apart from its event list
/// being cleared.
pub fn step(state: &GameState) -> GameState {
    let mut next = state.clone();
    next.events.clear();

    if next.is_game_over || next.is_game_paused {
        return next;
    }

    next.time_ticks += 1;

    if next.mode == GameMode::Single && spawn_pickups(&mut next) {
        // NeuTron spawn ticks do nothing else
        return next;
    }

    collect_pickups(&mut next);
    move_players(&mut next);
    move_bullets(&mut next);
    cleanup(&mut next, &state.tokens);
    evaluate_round_over(&mut next);

    next
}

/// Top up single-player pickups. Returns true if a NeuTron was spawned.
fn spawn_pickups(state: &mut GameState) -> bool {
    let Some(player) = state.players.first() else {
        return false;
    };
    let (bombs, hydro_collected, bullets) = (
        player.neutron_bombs,
        player.hydrotrons_collected,
        player.bullets,
    );

    if bombs >= HYDROTRON_THRESHOLD {
        let desired = (bombs / HYDROTRON_THRESHOLD) as usize;
        while state.hydrotrons.len() < desired {
            if !state.spawn_hydrotron() {
                break;
            }
        }
    }

    if hydro_collected >= GRAVITRON_THRESHOLD && state.gravitron.is_none() && state.spawn_gravitron()
    {
        log::info!("GraviTron has appeared");
    }

    bullets >= NEUTRON_BOMB_THRESHOLD && state.neutron.is_none() && state.spawn_neutron()
}

fn collect_pickups(state: &mut GameState) {
    let bonus_mode = state.mode == GameMode::Single;

    for i in 0..state.players.len() {
        if !state.players[i].is_alive {
            continue;
        }
        let pos = state.players[i].position;
        let id = state.players[i].id;

        // Tokens: at most one per player per tick
        if let Some(token) = state
            .tokens
            .iter_mut()
            .find(|t| !t.collected && t.position == pos)
        {
            token.collected = true;
            state.players[i].bullets += 1;
            if bonus_mode && i == 0 {
                state.tokens_collected += 1;
            }
            state.events.push(GameEvent::TokenCollected { player: id });
            state.spawn_token();
        }

        if !(bonus_mode && i == 0) {
            continue;
        }

        if let Some(neutron) = state
            .neutron
            .as_mut()
            .filter(|n| !n.collected && n.position == pos)
        {
            neutron.collected = true;
            let player = &mut state.players[i];
            player.bullets = player.bullets.saturating_sub(NEUTRON_BOMB_THRESHOLD);
            player.neutron_bombs += 1;
            player.trail.clear();
            state.events.push(GameEvent::NeutronCollected { player: id });
            log::debug!("Player {} collected a NeuTron", id);
        }

        if let Some(hydro) = state
            .hydrotrons
            .iter_mut()
            .find(|h| !h.collected && h.position == pos)
        {
            hydro.collected = true;
            let player = &mut state.players[i];
            player.hydrotrons_collected += 1;
            player.neutron_bombs = player.neutron_bombs.saturating_sub(HYDROTRON_THRESHOLD);
            state.events.push(GameEvent::HydroTronCollected { player: id });
            log::debug!(
                "Player {} collected a HydroTron ({} total)",
                id,
                state.players[i].hydrotrons_collected
            );
            for _ in 0..HYDROTRON_TOKEN_REWARD {
                state.spawn_token();
            }
        }

        // Collection wins over evasion
        if let Some(gravitron) = state
            .gravitron
            .as_mut()
            .filter(|g| !g.collected && g.position == pos)
        {
            gravitron.collected = true;
            gravitron.active = false;
            state.gravitron_active = false;
            state.gravitron_death = true;
            let player = &mut state.players[i];
            player.is_alive = false;
            player.hydrotrons_collected = 0;
            player.trail.clear();
            state.events.push(GameEvent::GraviTronCollected { player: id });
            state.events.push(GameEvent::PlayerDied { player: id });
            log::info!("Player {} collected the GraviTron", id);
            continue;
        }

        let bullets = state.players[i].bullets;
        let evades = state.gravitron.is_some_and(|g| {
            !g.collected
                && manhattan_distance(pos, g.position) <= GRAVITRON_PROXIMITY_THRESHOLD
                && bullets < STABILITY_THRESHOLD
        });
        if evades && let Some(to) = state.free_cell() {
            if let Some(gravitron) = state.gravitron.as_mut() {
                gravitron.position = to;
            }
            state.events.push(GameEvent::GraviTronEvaded { to });
        }
    }
}

fn move_players(state: &mut GameState) {
    let was_alive: Vec<bool> = state.players.iter().map(|p| p.is_alive).collect();

    // Every living head joins its trail before anyone moves
    for player in state.players.iter_mut().filter(|p| p.is_alive) {
        player.trail.push(player.position);
    }
    let trail_cells: HashSet<Position> = state
        .players
        .iter()
        .flat_map(|p| p.trail.iter().copied())
        .collect();

    let grid = state.grid;
    let mut targets: Vec<Option<Position>> = Vec::with_capacity(state.players.len());
    for player in state.players.iter_mut() {
        if !player.is_alive {
            targets.push(None);
            continue;
        }
        player.direction = player.pending_direction;
        let target = translate(player.position, player.direction);
        if is_out_of_bounds(target, grid) || trail_cells.contains(&target) {
            player.is_alive = false;
            targets.push(None);
        } else {
            targets.push(Some(target));
        }
    }

    if state.mode == GameMode::Two {
        for i in 0..targets.len() {
            for j in (i + 1)..targets.len() {
                if targets[i].is_some() && targets[i] == targets[j] {
                    state.players[i].is_alive = false;
                    state.players[j].is_alive = false;
                    targets[i] = None;
                    targets[j] = None;
                }
            }
        }
    }

    for (player, target) in state.players.iter_mut().zip(targets) {
        if let Some(target) = target {
            player.position = target;
        }
    }

    for (player, was_alive) in state.players.iter().zip(was_alive) {
        if was_alive && !player.is_alive {
            state.events.push(GameEvent::PlayerDied { player: player.id });
        }
    }
}

fn move_bullets(state: &mut GameState) {
    for b in 0..state.bullets.len() {
        for _ in 0..BULLET_SPEED {
            let bullet = state.bullets[b];
            if !bullet.active {
                break;
            }

            let next = translate(bullet.position, bullet.direction);
            if is_out_of_bounds(next, state.grid) {
                state.bullets[b].active = false;
                break;
            }

            // First player in order, first trail cell from the tail
            let hit = state.players.iter().enumerate().find_map(|(p, player)| {
                player
                    .trail
                    .iter()
                    .position(|cell| *cell == next)
                    .map(|index| (p, index))
            });

            if let Some((p, index)) = hit {
                let removed = cut_trail(&mut state.players[p].trail, index);
                state.bullets[b].active = false;
                state.events.push(GameEvent::TrailCut {
                    player: state.players[p].id,
                    removed,
                });
                break;
            }

            state.bullets[b].position = next;
        }
    }
}

/// Cut a trail where a bullet struck it. Everything from the tail up to and
/// including `hit` is destroyed; the head-ward remainder survives. Returns
/// the number of cells removed.
pub fn cut_trail(trail: &mut Vec<Position>, hit: usize) -> usize {
    let removed = (hit + 1).min(trail.len());
    trail.drain(..removed);
    removed
}

fn cleanup(state: &mut GameState, previous_tokens: &[Token]) {
    state.bullets.retain(|b| b.active);

    let remaining: Vec<Token> = state.tokens.iter().copied().filter(|t| !t.collected).collect();
    state.tokens = if remaining.is_empty() {
        previous_tokens.to_vec()
    } else {
        remaining
    };

    state.hydrotrons.retain(|h| !h.collected);

    if state.neutron.is_some_and(|n| n.collected) {
        state.neutron = None;
    }
}

fn evaluate_round_over(state: &mut GameState) {
    if state.gravitron_death {
        state.is_game_over = true;
        state.winner = None;
    } else {
        let alive: Vec<usize> = state
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_alive)
            .map(|(i, _)| i)
            .collect();

        match (state.mode, alive.as_slice()) {
            (_, []) => {
                state.is_game_over = true;
                state.winner = None;
            }
            (GameMode::Two, [survivor]) => {
                let winner = &mut state.players[*survivor];
                winner.score += 1;
                state.is_game_over = true;
                state.winner = Some(winner.id);
            }
            _ => {}
        }
    }

    if state.is_game_over {
        state.events.push(GameEvent::RoundOver {
            winner: state.winner,
        });
    }
}
