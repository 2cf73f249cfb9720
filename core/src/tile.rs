use alloc::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::*;

/// Identity of a tile, unique for the lifetime of the grid that issued it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub position: Coord2,
    pub value: u32,
}

impl Tile {
    pub const fn x(&self) -> Coord {
        self.position.0
    }

    pub const fn y(&self) -> Coord {
        self.position.1
    }

    /// Equal values merge, unless the doubled value would not fit a `u32`.
    pub const fn can_merge_with(&self, other: &Tile) -> bool {
        self.value == other.value && self.value.checked_mul(2).is_some()
    }
}

/// What happened to one tile during the last move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileMotion {
    pub tile: Tile,
    pub previous_position: Option<Coord2>,
    /// Both sources, each at the cell it converged on, when this tile is a merge result.
    pub merged_from: Option<[Tile; 2]>,
}

/// Per-move bookkeeping kept beside the grid and rebuilt for every move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveAnnotations {
    motions: BTreeMap<TileId, TileMotion>,
}

impl MoveAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_previous(&mut self, tile: Tile) {
        self.motions.insert(
            tile.id,
            TileMotion {
                tile,
                previous_position: Some(tile.position),
                merged_from: None,
            },
        );
    }

    /// Follows a surviving tile to where it ended up.
    pub fn record_moved(&mut self, tile: Tile) {
        if let Some(motion) = self.motions.get_mut(&tile.id) {
            motion.tile = tile;
        }
    }

    /// Registers `merged` as produced this move; both sources stop being live tiles.
    pub fn record_merge(&mut self, merged: Tile, sources: [Tile; 2]) {
        for source in &sources {
            self.motions.remove(&source.id);
        }
        self.motions.insert(
            merged.id,
            TileMotion {
                tile: merged,
                previous_position: None,
                merged_from: Some(sources),
            },
        );
    }

    pub fn record_spawn(&mut self, tile: Tile) {
        self.motions.insert(
            tile.id,
            TileMotion {
                tile,
                previous_position: None,
                merged_from: None,
            },
        );
    }

    pub fn is_merge_result(&self, id: TileId) -> bool {
        self.motions
            .get(&id)
            .is_some_and(|motion| motion.merged_from.is_some())
    }

    pub fn motion(&self, id: TileId) -> Option<&TileMotion> {
        self.motions.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileMotion> {
        self.motions.values()
    }

    pub fn merge_count(&self) -> usize {
        self.motions
            .values()
            .filter(|motion| motion.merged_from.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}
