//! Demo autopilot
//!
//! Steers a player for idle/demo play: avoid anything that would kill it on
//! the next tick, and head for the nearest token when it is safe to do so.

use crate::sim::grid::{Direction, is_out_of_bounds, manhattan_distance, translate};
use crate::sim::{GameState, Position};

/// Pick a steering direction for `player_id`.
///
/// Returns `None` when the current heading is already the best choice, the
/// player is dead, or nothing is safe.
pub fn choose_direction(state: &GameState, player_id: u8) -> Option<Direction> {
    let player = state.player(player_id).filter(|p| p.is_alive)?;
    let heading = player.pending_direction;

    let candidates = [heading, heading.clockwise(), heading.counter_clockwise()];
    let target = nearest_token(state, player.position);

    let best = candidates
        .into_iter()
        .filter(|&d| is_safe(state, player_id, translate(player.position, d)))
        .min_by_key(|&d| {
            let next = translate(player.position, d);
            // Keep the heading on ties
            let turn_penalty = i32::from(d != heading);
            let distance = target.map_or(0, |t| manhattan_distance(next, t));
            (distance, turn_penalty)
        })?;

    (best != heading).then_some(best)
}

fn nearest_token(state: &GameState, from: Position) -> Option<Position> {
    state
        .tokens
        .iter()
        .filter(|t| !t.collected)
        .map(|t| t.position)
        .min_by_key(|&p| manhattan_distance(from, p))
}

fn is_safe(state: &GameState, player_id: u8, cell: Position) -> bool {
    if is_out_of_bounds(cell, state.grid) {
        return false;
    }
    let blocked_by_player = state.players.iter().any(|p| {
        p.trail.contains(&cell) || (p.id != player_id && p.is_alive && p.position == cell)
    });
    // Touching the GraviTron ends the run
    let gravitron = state
        .gravitron
        .is_some_and(|g| !g.collected && g.position == cell);
    !blocked_by_player && !gravitron
}
