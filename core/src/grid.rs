use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use crate::*;

/// Square board owning every live tile, indexed `[x, y]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    cells: Array2<Option<Tile>>,
    next_id: u32,
}

impl Grid {
    pub fn new(size: Coord) -> Self {
        Self {
            cells: Array2::default((size, size).to_nd_index()),
            next_id: 0,
        }
    }

    /// Rebuilds a grid from its stored form, refusing anything that would break the
    /// one-tile-per-matching-cell invariant.
    pub fn from_state(state: &GridState) -> Result<Self> {
        let size = state.size;
        if size == 0 || state.cells.len() != usize::from(size) {
            return Err(GameError::InvalidBoardShape);
        }

        let mut grid = Self::new(size);
        for (x, column) in state.cells.iter().enumerate() {
            if column.len() != usize::from(size) {
                return Err(GameError::InvalidBoardShape);
            }
            for (y, cell) in column.iter().enumerate() {
                let Some(tile) = cell else {
                    continue;
                };
                let position: Coord2 = tile.position.into();
                if position.to_nd_index() != [x, y] {
                    return Err(GameError::InvalidCoords);
                }
                if tile.value < 2 || !tile.value.is_power_of_two() {
                    return Err(GameError::InvalidTileValue);
                }
                grid.insert_new_tile(position, tile.value);
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> Coord {
        // constructed square from a `Coord`
        self.cells.dim().0 as Coord
    }

    pub fn within_bounds(&self, (x, y): Coord2) -> bool {
        let size = self.size();
        x < size && y < size
    }

    pub fn cell_content(&self, position: Coord2) -> Option<Tile> {
        if self.within_bounds(position) {
            self.cells[position.to_nd_index()]
        } else {
            None
        }
    }

    pub fn cell_occupied(&self, position: Coord2) -> bool {
        self.cell_content(position).is_some()
    }

    pub fn cell_available(&self, position: Coord2) -> bool {
        !self.cell_occupied(position)
    }

    /// Empty cells, `x` outer and `y` inner.
    pub fn available_cells(&self) -> Vec<Coord2> {
        self.iter_cells()
            .filter(|(_, tile)| tile.is_none())
            .map(|(position, _)| position)
            .collect()
    }

    pub fn cells_available(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        !self.cells_available()
    }

    pub fn random_available_cell(&self, rng: &mut SmallRng) -> Option<Coord2> {
        let cells = self.available_cells();
        if cells.is_empty() {
            return None;
        }
        Some(cells[rng.random_range(0..cells.len())])
    }

    /// Live tiles, `x` outer and `y` inner.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.iter_cells().filter_map(|(_, tile)| tile)
    }

    pub fn tile_count(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    /// Places `tile` at its own position, replacing whatever was there.
    pub fn insert_tile(&mut self, tile: Tile) {
        self.cells[tile.position.to_nd_index()] = Some(tile);
    }

    pub fn insert_new_tile(&mut self, position: Coord2, value: u32) -> Tile {
        let tile = Tile {
            id: self.issue_id(),
            position,
            value,
        };
        self.insert_tile(tile);
        tile
    }

    pub fn remove_tile(&mut self, tile: &Tile) {
        self.cells[tile.position.to_nd_index()] = None;
    }

    pub fn move_tile(&mut self, tile: Tile, to: Coord2) -> Tile {
        self.remove_tile(&tile);
        let moved = Tile {
            position: to,
            ..tile
        };
        self.insert_tile(moved);
        moved
    }

    /// Walks from `from` along `direction` over empty cells. Returns the farthest empty cell
    /// reached (or `from` itself) and the cell just beyond it, if that one is on the board.
    pub fn find_farthest_position(
        &self,
        from: Coord2,
        direction: Direction,
    ) -> (Coord2, Option<Coord2>) {
        let size = self.size();
        let mut farthest = from;
        loop {
            match step(farthest, direction, size) {
                Some(next) if self.cell_available(next) => farthest = next,
                next => return (farthest, next),
            }
        }
    }

    /// Whether any tile sits next to another tile of the same value.
    pub fn tile_matches_available(&self) -> bool {
        let size = self.size();
        self.tiles().any(|tile| {
            iter_neighbors(tile.position, size)
                .filter_map(|position| self.cell_content(position))
                .any(|other| tile.can_merge_with(&other))
        })
    }

    pub fn serialize(&self) -> GridState {
        let size = self.size();
        let cells = (0..size)
            .map(|x| {
                (0..size)
                    .map(|y| self.cells[(x, y).to_nd_index()].map(TileState::from))
                    .collect()
            })
            .collect();
        GridState { size, cells }
    }

    fn iter_cells(&self) -> impl Iterator<Item = (Coord2, Option<Tile>)> + '_ {
        let size = self.size();
        (0..size)
            .flat_map(move |x| (0..size).map(move |y| (x, y)))
            .map(|position| (position, self.cells[position.to_nd_index()]))
    }

    fn issue_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }
}

impl Index<Coord2> for Grid {
    type Output = Option<Tile>;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;
    use alloc::vec;

    #[test]
    fn empty_grid_lists_every_cell_in_column_order() {
        let grid = Grid::new(2);

        assert_eq!(grid.available_cells(), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        assert!(grid.cells_available());
        assert_eq!(grid.tile_count(), 0);
    }

    #[test]
    fn out_of_bounds_reads_as_empty() {
        let mut grid = Grid::new(2);
        grid.insert_new_tile((1, 1), 2);

        assert_eq!(grid.cell_content((2, 1)), None);
        assert!(grid.cell_available((7, 0)));
        assert!(grid.cell_occupied((1, 1)));
        assert!(!grid.within_bounds((2, 0)));
        assert!(grid.within_bounds((1, 1)));
    }

    #[test]
    fn random_cell_is_always_empty() {
        let mut grid = Grid::new(3);
        for position in [(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1), (0, 2), (1, 2)] {
            grid.insert_new_tile(position, 2);
        }
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..10 {
            assert_eq!(grid.random_available_cell(&mut rng), Some((2, 2)));
        }

        grid.insert_new_tile((2, 2), 4);
        assert_eq!(grid.random_available_cell(&mut rng), None);
        assert!(grid.is_full());
    }

    #[test]
    fn random_cell_reaches_every_free_cell() {
        let mut grid = Grid::new(4);
        grid.insert_new_tile((1, 1), 2);
        grid.insert_new_tile((3, 0), 8);
        let free = grid.available_cells();
        let mut rng = SmallRng::seed_from_u64(11);

        let mut seen = BTreeSet::new();
        for _ in 0..1000 {
            let position = grid.random_available_cell(&mut rng).unwrap();
            assert!(grid.cell_available(position));
            seen.insert(position);
        }

        assert_eq!(seen.into_iter().collect::<Vec<_>>(), free);
    }

    #[test]
    fn farthest_position_stops_before_obstacles() {
        let mut grid = Grid::new(4);
        grid.insert_new_tile((0, 2), 2);

        assert_eq!(
            grid.find_farthest_position((3, 2), Direction::Left),
            ((1, 2), Some((0, 2)))
        );
        assert_eq!(
            grid.find_farthest_position((3, 2), Direction::Up),
            ((3, 0), None)
        );
        assert_eq!(
            grid.find_farthest_position((3, 2), Direction::Right),
            ((3, 2), None)
        );
    }

    #[test]
    fn move_tile_keeps_identity() {
        let mut grid = Grid::new(4);
        let tile = grid.insert_new_tile((3, 0), 8);

        let moved = grid.move_tile(tile, (0, 0));

        assert_eq!(moved.id, tile.id);
        assert_eq!(grid[(0, 0)], Some(moved));
        assert_eq!(grid[(3, 0)], None);
        assert_eq!(grid.tile_count(), 1);
    }

    #[test]
    fn matches_need_equal_orthogonal_neighbors() {
        let mut grid = Grid::new(2);
        grid.insert_new_tile((0, 0), 2);
        grid.insert_new_tile((1, 1), 2);
        assert!(!grid.tile_matches_available());

        grid.insert_new_tile((1, 0), 2);
        assert!(grid.tile_matches_available());
    }

    #[test]
    fn state_roundtrip_preserves_tiles() {
        let mut grid = Grid::new(3);
        grid.insert_new_tile((0, 2), 2);
        grid.insert_new_tile((2, 1), 64);

        let state = grid.serialize();
        assert_eq!(state.cells[2][1].map(|tile| tile.value), Some(64));

        let restored = Grid::from_state(&state).unwrap();
        assert_eq!(restored.serialize(), state);
    }

    #[test]
    fn from_state_rejects_inconsistent_input() {
        let mut state = Grid::new(2).serialize();
        state.cells[0][1] = Some(TileState {
            position: PositionState { x: 1, y: 0 },
            value: 2,
        });
        assert_eq!(Grid::from_state(&state), Err(GameError::InvalidCoords));

        state.cells[0][1] = Some(TileState {
            position: PositionState { x: 0, y: 1 },
            value: 6,
        });
        assert_eq!(Grid::from_state(&state), Err(GameError::InvalidTileValue));

        state.cells[0][1] = None;
        state.cells.pop();
        assert_eq!(Grid::from_state(&state), Err(GameError::InvalidBoardShape));

        let empty = GridState {
            size: 0,
            cells: vec![],
        };
        assert_eq!(Grid::from_state(&empty), Err(GameError::InvalidBoardShape));
    }
}
