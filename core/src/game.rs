use alloc::vec::Vec;
use rand::prelude::*;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Win standing a board had when it ran out of moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinStatus {
    NotWon,
    Won,
    WonContinuing,
}

/// Valid transitions:
/// - Active -> Won
/// - Active -> Over
/// - Won -> WonContinuing
/// - WonContinuing -> Over
///
/// A single move can also go Active -> Over(Won) when the winning merge fills the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    /// Winning tile reached, moves are blocked until the player keeps playing.
    Won,
    WonContinuing,
    Over(WinStatus),
}

impl SessionState {
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Won | Self::Over(_))
    }

    pub const fn is_over(self) -> bool {
        matches!(self, Self::Over(_))
    }

    pub const fn is_won(self) -> bool {
        matches!(
            self,
            Self::Won
                | Self::WonContinuing
                | Self::Over(WinStatus::Won | WinStatus::WonContinuing)
        )
    }

    pub const fn keeps_playing(self) -> bool {
        matches!(
            self,
            Self::WonContinuing | Self::Over(WinStatus::WonContinuing)
        )
    }

    /// Builds the state from stored `over`, `won`, `keepPlaying` flags. Keeping playing means
    /// nothing before a win, so that flag is dropped then.
    pub fn from_flags(over: bool, won: bool, keep_playing: bool) -> Self {
        if keep_playing && !won {
            log::warn!("Stored session keeps playing without a win, ignoring");
        }
        let status = match (won, keep_playing) {
            (false, _) => WinStatus::NotWon,
            (true, false) => WinStatus::Won,
            (true, true) => WinStatus::WonContinuing,
        };
        match (over, status) {
            (true, status) => Self::Over(status),
            (false, WinStatus::NotWon) => Self::Active,
            (false, WinStatus::Won) => Self::Won,
            (false, WinStatus::WonContinuing) => Self::WonContinuing,
        }
    }

    /// `(over, won, keep_playing)`
    pub const fn flags(self) -> (bool, bool, bool) {
        (self.is_over(), self.is_won(), self.keeps_playing())
    }

    const fn win_status(self) -> WinStatus {
        match self {
            Self::Active => WinStatus::NotWon,
            Self::Won => WinStatus::Won,
            Self::WonContinuing => WinStatus::WonContinuing,
            Self::Over(status) => status,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Active
    }
}

/// Everything one call to [`Game::apply_move`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveReport {
    pub outcome: MoveOutcome,
    pub direction: Direction,
    pub score_gained: u32,
    pub merges: usize,
    pub spawned: Option<Tile>,
    pub annotations: MoveAnnotations,
}

impl MoveReport {
    fn unchanged(outcome: MoveOutcome, direction: Direction) -> Self {
        Self {
            outcome,
            direction,
            score_gained: 0,
            merges: 0,
            spawned: None,
            annotations: MoveAnnotations::new(),
        }
    }
}

/// Traversal order for one move: cells nearest the target edge come first.
struct Traversals {
    xs: Vec<Coord>,
    ys: Vec<Coord>,
}

impl Traversals {
    fn new(size: Coord, direction: Direction) -> Self {
        let (dx, dy) = direction.vector();
        let mut xs: Vec<Coord> = (0..size).collect();
        let mut ys: Vec<Coord> = (0..size).collect();
        if dx == 1 {
            xs.reverse();
        }
        if dy == 1 {
            ys.reverse();
        }
        Self { xs, ys }
    }

    fn iter(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.xs
            .iter()
            .flat_map(move |&x| self.ys.iter().map(move |&y| (x, y)))
    }
}

/// Rules of one game: board, score and win/loss state, without any I/O.
#[derive(Clone, Debug, PartialEq)]
pub struct Game {
    grid: Grid,
    score: u32,
    state: SessionState,
    config: GameConfig,
}

impl Game {
    /// Fresh game with `config.start_tiles` random tiles.
    pub fn new(config: GameConfig, rng: &mut SmallRng) -> Self {
        let mut game = Self::with_grid(Grid::new(config.size), config);
        for _ in 0..config.start_tiles {
            game.add_random_tile(rng);
        }
        game
    }

    /// Game on a prepared board, score zero.
    pub fn with_grid(grid: Grid, config: GameConfig) -> Self {
        Self {
            grid,
            score: 0,
            state: SessionState::Active,
            config,
        }
    }

    /// Restores a stored game. The stored board size wins over `config.size`.
    pub fn from_session(session: &SerializedSession, config: GameConfig) -> Result<Self> {
        let grid = Grid::from_state(&session.grid)?;
        if grid.size() != config.size {
            log::info!(
                "Restoring a {}x{} board, configured size is {}",
                grid.size(),
                grid.size(),
                config.size
            );
        }
        Ok(Self {
            grid,
            score: session.score,
            state: SessionState::from_flags(session.over, session.won, session.keep_playing),
            config,
        })
    }

    pub fn serialize(&self) -> SerializedSession {
        let (over, won, keep_playing) = self.state.flags();
        SerializedSession {
            grid: self.grid.serialize(),
            score: self.score,
            over,
            won,
            keep_playing,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Lost, or won without the player choosing to keep playing.
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    /// Lets the player continue after reaching the winning tile.
    pub fn keep_playing(&mut self) -> Result<()> {
        self.state = match self.state {
            SessionState::Won | SessionState::WonContinuing => SessionState::WonContinuing,
            SessionState::Over(WinStatus::Won | WinStatus::WonContinuing) => {
                SessionState::Over(WinStatus::WonContinuing)
            }
            SessionState::Active | SessionState::Over(WinStatus::NotWon) => {
                return Err(GameError::NotWon);
            }
        };
        Ok(())
    }

    /// Spawns a 2 (or, rarely, a 4) on a random empty cell. Does nothing on a full board.
    pub fn add_random_tile(&mut self, rng: &mut SmallRng) -> Option<Tile> {
        let position = self.grid.random_available_cell(rng)?;
        let value = if rng.random_bool(self.config.four_probability) {
            4
        } else {
            2
        };
        Some(self.grid.insert_new_tile(position, value))
    }

    /// Any empty cell, or any pair of equal neighbours.
    pub fn moves_available(&self) -> bool {
        self.grid.cells_available() || self.grid.tile_matches_available()
    }

    /// Slides every tile towards `direction`, merging equal pairs once, then spawns a tile and
    /// checks for the end of the game. Leaves everything untouched when nothing can move.
    pub fn apply_move(&mut self, direction: Direction, rng: &mut SmallRng) -> MoveReport {
        if self.is_terminated() {
            return MoveReport::unchanged(MoveOutcome::Ignored, direction);
        }

        let mut annotations = MoveAnnotations::new();
        for tile in self.grid.tiles() {
            annotations.record_previous(tile);
        }

        let mut moved = false;
        let mut score_gained = 0u32;
        let mut merges = 0;
        let mut reached_goal = false;

        let traversals = Traversals::new(self.grid.size(), direction);
        for cell in traversals.iter() {
            let Some(tile) = self.grid.cell_content(cell) else {
                continue;
            };

            let (farthest, next) = self.grid.find_farthest_position(cell, direction);
            let merge_target = next
                .and_then(|position| self.grid.cell_content(position))
                .filter(|other| {
                    tile.can_merge_with(other) && !annotations.is_merge_result(other.id)
                });

            if let Some(other) = merge_target {
                let value = tile.value * 2;
                self.grid.remove_tile(&tile);
                let merged = self.grid.insert_new_tile(other.position, value);
                let converged = Tile {
                    position: other.position,
                    ..tile
                };
                annotations.record_merge(merged, [converged, other]);
                log::trace!("{:?} -> {:?} merged into {}", cell, other.position, value);

                score_gained = score_gained.saturating_add(value);
                merges += 1;
                if value >= self.config.winning_value {
                    reached_goal = true;
                }
                moved = true;
            } else if farthest != cell {
                let slid = self.grid.move_tile(tile, farthest);
                annotations.record_moved(slid);
                log::trace!("{:?} -> {:?} slid", cell, farthest);
                moved = true;
            }
        }

        if !moved {
            log::debug!("{:?}: nothing moved", direction);
            return MoveReport::unchanged(MoveOutcome::NoChange, direction);
        }

        self.score = self.score.saturating_add(score_gained);

        let mut outcome = MoveOutcome::Moved;
        if reached_goal && self.state == SessionState::Active {
            self.state = SessionState::Won;
            outcome = MoveOutcome::Won;
        }

        let spawned = self.add_random_tile(rng);
        if let Some(tile) = spawned {
            annotations.record_spawn(tile);
        }

        if !self.moves_available() {
            self.state = SessionState::Over(self.state.win_status());
            outcome = MoveOutcome::Over;
        }

        log::debug!(
            "{:?}: {} merges, +{} points, state {:?}",
            direction,
            merges,
            score_gained,
            self.state
        );

        MoveReport {
            outcome,
            direction,
            score_gained,
            merges,
            spawned,
            annotations,
        }
    }
}
