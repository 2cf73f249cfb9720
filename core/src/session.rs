//! Wire format of a saved game and of the snapshots handed to the presentation layer.
//!
//! Field names are camelCase so a state saved by any front-end of the game can be restored
//! verbatim.

use alloc::string::String;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionState {
    pub x: Coord,
    pub y: Coord,
}

impl From<Coord2> for PositionState {
    fn from((x, y): Coord2) -> Self {
        Self { x, y }
    }
}

impl From<PositionState> for Coord2 {
    fn from(position: PositionState) -> Self {
        (position.x, position.y)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileState {
    pub position: PositionState,
    pub value: u32,
}

impl From<Tile> for TileState {
    fn from(tile: Tile) -> Self {
        Self {
            position: tile.position.into(),
            value: tile.value,
        }
    }
}

/// `cells[x][y]`, `None` for an empty cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridState {
    pub size: Coord,
    pub cells: Vec<Vec<Option<TileState>>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedSession {
    pub grid: GridState,
    pub score: u32,
    pub over: bool,
    pub won: bool,
    pub keep_playing: bool,
}

impl SerializedSession {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| {
            log::error!("Could not encode session: {}", err);
            GameError::UnencodableState
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            log::debug!("Could not parse stored session: {}", err);
            GameError::MalformedState
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionState {
    pub tile: TileState,
    pub previous_position: Option<PositionState>,
    pub merged_from: Option<[TileState; 2]>,
}

impl From<&TileMotion> for MotionState {
    fn from(motion: &TileMotion) -> Self {
        Self {
            tile: motion.tile.into(),
            previous_position: motion.previous_position.map(Into::into),
            merged_from: motion.merged_from.map(|sources| sources.map(Into::into)),
        }
    }
}

/// Everything the presentation layer needs after setup or an accepted move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub grid: GridState,
    pub score: u32,
    pub best_score: u32,
    pub over: bool,
    pub won: bool,
    pub terminated: bool,
    pub motions: Vec<MotionState>,
}
