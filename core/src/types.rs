use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board size and positions.
pub type Coord = u8;

/// Two-dimensional coordinates `(x, y)`, `x` being the column.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

/// Direction of a move, numbered the way input codes arrive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Maps an input code, anything outside `0..=3` is not a direction.
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// Arrow-less key map: `wasd` and vim's `hjkl`.
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'w' | 'k' => Some(Self::Up),
            'd' | 'l' => Some(Self::Right),
            's' | 'j' => Some(Self::Down),
            'a' | 'h' => Some(Self::Left),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Unit vector `(dx, dy)`, with `y` growing downwards.
    pub const fn vector(self) -> (i8, i8) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

/// Moves `coords` one cell along `direction`, returning a value only when it remains on a
/// `size` x `size` board.
pub fn step(coords: Coord2, direction: Direction, size: Coord) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = direction.vector();

    let next_x = x.checked_add_signed(dx)?;
    if next_x >= size {
        return None;
    }

    let next_y = y.checked_add_signed(dy)?;
    if next_y >= size {
        return None;
    }

    Some((next_x, next_y))
}

/// Iterates the orthogonal neighbours of a cell that lie on the board.
pub fn iter_neighbors(coords: Coord2, size: Coord) -> impl Iterator<Item = Coord2> {
    Direction::ALL
        .into_iter()
        .filter_map(move |direction| step(coords, direction, size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_directions() {
        assert_eq!(Direction::from_code(0), Some(Direction::Up));
        assert_eq!(Direction::from_code(3), Some(Direction::Left));
        assert_eq!(Direction::from_code(4), None);
        assert_eq!(Direction::from_code(-1), None);
        for direction in Direction::ALL {
            assert_eq!(Direction::from_code(direction.code().into()), Some(direction));
        }
    }

    #[test]
    fn keys_follow_wasd_and_vim() {
        assert_eq!(Direction::from_key('W'), Some(Direction::Up));
        assert_eq!(Direction::from_key('l'), Some(Direction::Right));
        assert_eq!(Direction::from_key('j'), Some(Direction::Down));
        assert_eq!(Direction::from_key('a'), Some(Direction::Left));
        assert_eq!(Direction::from_key('r'), None);
    }

    #[test]
    fn step_stops_at_edges() {
        assert_eq!(step((0, 0), Direction::Up, 4), None);
        assert_eq!(step((0, 0), Direction::Left, 4), None);
        assert_eq!(step((3, 3), Direction::Right, 4), None);
        assert_eq!(step((3, 3), Direction::Down, 4), None);
        assert_eq!(step((1, 2), Direction::Up, 4), Some((1, 1)));
        assert_eq!(step((1, 2), Direction::Right, 4), Some((2, 2)));
    }

    #[test]
    fn corner_has_two_neighbors() {
        let mut neighbors: alloc::vec::Vec<_> = iter_neighbors((0, 0), 3).collect();
        neighbors.sort();
        assert_eq!(neighbors, [(0, 1), (1, 0)]);
        assert_eq!(iter_neighbors((1, 1), 3).count(), 4);
    }
}
