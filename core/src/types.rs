use serde::{Deserialize, Serialize};

/// Single coordinate axis used for grid rows, columns, and positions.
pub type Coord = u8;

/// Count type used for trap counts and total-cell counts.
pub type CellCount = u16;

/// Grid position `(row, col)`, 0-indexed from the top-left corner.
pub type Position = (Coord, Coord);

/// The player always starts in the top-left corner.
pub const START: Position = (0, 0);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Position {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector as `(d_row, d_col)`.
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    /// Neighboring position in this direction, `None` when it would leave a grid of `bounds`.
    pub fn step(self, from: Position, bounds: Position) -> Option<Position> {
        apply_delta(from, self.delta(), bounds)
    }
}

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Position, delta: (i8, i8), bounds: Position) -> Option<Position> {
    let (row, col) = coords;
    let (d_row, d_col) = delta;
    let (rows, cols) = bounds;

    let next_row = row.checked_add_signed(d_row)?;
    if next_row >= rows {
        return None;
    }

    let next_col = col.checked_add_signed(d_col)?;
    if next_col >= cols {
        return None;
    }

    Some((next_row, next_col))
}
