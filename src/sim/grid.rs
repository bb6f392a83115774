//! Grid geometry helpers
//!
//! Integer cell coordinates, directions and spawn-cell sampling.

use std::collections::HashSet;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_SPAWN_ATTEMPTS;

/// A grid cell. `x` grows to the right, `y` grows downward.
pub type Position = IVec2;

/// Grid dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

impl GridSize {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }
}

/// Heading of a player or bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit step for one cell of travel
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    /// Turn 90° clockwise (screen coordinates)
    pub fn clockwise(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        self.clockwise().opposite()
    }
}

/// A turn is valid unless it reverses straight back into the trail.
pub fn is_valid_direction_change(current: Direction, requested: Direction) -> bool {
    current.opposite() != requested
}

/// Cell reached by moving one step from `pos`
#[inline]
pub fn translate(pos: Position, direction: Direction) -> Position {
    pos + direction.offset()
}

#[inline]
pub fn is_out_of_bounds(pos: Position, grid: GridSize) -> bool {
    pos.x < 0 || pos.y < 0 || pos.x >= grid.width || pos.y >= grid.height
}

#[inline]
pub fn positions_equal(a: Position, b: Position) -> bool {
    a == b
}

#[inline]
pub fn manhattan_distance(a: Position, b: Position) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Pick a random cell not in `occupied`.
///
/// Rejection-samples up to [`MAX_SPAWN_ATTEMPTS`] times, then scans the grid
/// row by row. Returns `None` only when every cell is occupied.
pub fn random_unoccupied_position<R: Rng>(
    rng: &mut R,
    grid: GridSize,
    occupied: &HashSet<Position>,
) -> Option<Position> {
    if grid.width <= 0 || grid.height <= 0 {
        return None;
    }

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        let candidate = IVec2::new(
            rng.random_range(0..grid.width),
            rng.random_range(0..grid.height),
        );
        if !occupied.contains(&candidate) {
            return Some(candidate);
        }
    }

    // Pathological case: nearly full grid
    (0..grid.height)
        .flat_map(|y| (0..grid.width).map(move |x| IVec2::new(x, y)))
        .find(|cell| !occupied.contains(cell))
}
