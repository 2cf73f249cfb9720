#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use engine::*;
pub use error::*;
pub use game::*;
pub use grid::*;
pub use persistence::*;
pub use session::*;
pub use tile::*;
pub use types::*;

mod engine;
mod error;
mod game;
mod grid;
mod persistence;
mod session;
mod tile;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub size: Coord,
    pub start_tiles: u8,
    pub winning_value: u32,
    /// Chance that a spawned tile is a 4 instead of a 2.
    pub four_probability: f64,
}

impl GameConfig {
    pub const DEFAULT_SIZE: Coord = 4;
    pub const DEFAULT_WINNING_VALUE: u32 = 2048;

    pub const fn new_unchecked(
        size: Coord,
        start_tiles: u8,
        winning_value: u32,
        four_probability: f64,
    ) -> Self {
        Self {
            size,
            start_tiles,
            winning_value,
            four_probability,
        }
    }

    pub fn new(size: Coord, start_tiles: u8, winning_value: u32, four_probability: f64) -> Self {
        let size = size.clamp(1, Coord::MAX);
        let winning_value = winning_value
            .clamp(4, 1 << 31)
            .checked_next_power_of_two()
            .unwrap_or(1 << 31);
        let four_probability = if four_probability.is_nan() {
            0.0
        } else {
            four_probability.clamp(0.0, 1.0)
        };
        Self::new_unchecked(size, start_tiles, winning_value, four_probability)
    }

    /// Re-applies the clamping of [`GameConfig::new`], for configs that came from a file.
    pub fn sanitized(self) -> Self {
        Self::new(
            self.size,
            self.start_tiles,
            self.winning_value,
            self.four_probability,
        )
    }

    pub const fn total_cells(&self) -> usize {
        (self.size as usize) * (self.size as usize)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(Self::DEFAULT_SIZE, 2, Self::DEFAULT_WINNING_VALUE, 0.1)
    }
}

/// Outcome of a single move request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game is terminated, nothing was looked at.
    Ignored,
    /// No tile could slide or merge in that direction.
    NoChange,
    Moved,
    /// The move produced the winning tile.
    Won,
    /// The move left no legal move behind.
    Over,
}

impl MoveOutcome {
    /// Whether this outcome changed the board, and so needs to be shown and saved
    pub const fn has_update(self) -> bool {
        use MoveOutcome::*;
        match self {
            Ignored => false,
            NoChange => false,
            Moved => true,
            Won => true,
            Over => true,
        }
    }
}
