#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use generator::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod event;
mod generator;
mod types;

/// Default countdown length in seconds.
pub const INITIAL_SECONDS: u32 = 30;

/// Where the goal cell ends up on a freshly generated maze.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalPlacement {
    /// Always the bottom-right corner, which is never a wall or trap.
    Fixed,
    /// Any cell left empty after walls and traps are placed.
    Random,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Position,
    pub traps: CellCount,
    pub initial_secs: u32,
    pub goal_placement: GoalPlacement,
}

impl GameConfig {
    /// Corner goal, dense traps.
    pub const CLASSIC: Self =
        Self::new_unchecked((10, 10), 15, INITIAL_SECONDS, GoalPlacement::Fixed);

    /// Goal anywhere, few traps.
    pub const SCATTERED: Self =
        Self::new_unchecked((10, 10), 5, INITIAL_SECONDS, GoalPlacement::Random);

    pub const fn new_unchecked(
        size: Position,
        traps: CellCount,
        initial_secs: u32,
        goal_placement: GoalPlacement,
    ) -> Self {
        Self {
            size,
            traps,
            initial_secs,
            goal_placement,
        }
    }

    pub fn new(
        size: Position,
        traps: CellCount,
        initial_secs: u32,
        goal_placement: GoalPlacement,
    ) -> Result<Self> {
        let config = Self::new_unchecked(size, traps, initial_secs, goal_placement);
        config.validate()?;
        Ok(config)
    }

    /// Checks that generation can always place every trap plus the start and goal cells.
    pub fn validate(&self) -> Result<()> {
        let (rows, cols) = self.size;
        if rows == 0 || cols == 0 || self.total_cells() < 2 {
            return Err(GameError::InvalidSize);
        }

        let available = self.trap_capacity();
        if self.traps > available {
            return Err(GameError::TooManyTraps {
                requested: self.traps,
                available,
            });
        }

        Ok(())
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// Cells a trap may occupy: everything except the start and the goal.
    pub const fn trap_capacity(&self) -> CellCount {
        self.total_cells().saturating_sub(2)
    }

    /// Bottom-right corner of the grid.
    pub const fn corner(&self) -> Position {
        (self.size.0.saturating_sub(1), self.size.1.saturating_sub(1))
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Immutable layout of one session: terrain plus the goal position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MazeRecord")]
pub struct Maze {
    cells: Array2<CellKind>,
    goal: Position,
    trap_count: CellCount,
}

impl Maze {
    pub(crate) fn from_cells(cells: Array2<CellKind>, goal: Position) -> Self {
        let trap_count = cells
            .iter()
            .filter(|&&kind| kind == CellKind::Trap)
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX);
        Self {
            cells,
            goal,
            trap_count,
        }
    }

    /// Builds a maze from explicit wall and trap lists, mostly useful for tests and replays.
    pub fn from_layout(
        size: Position,
        walls: &[Position],
        traps: &[Position],
        goal: Position,
    ) -> Result<Self> {
        let (rows, cols) = size;
        if rows == 0 || cols == 0 || mult(rows, cols) < 2 {
            return Err(GameError::InvalidSize);
        }

        let in_bounds = |pos: &Position| pos.0 < rows && pos.1 < cols;
        if !walls.iter().chain(traps).chain([&goal]).all(in_bounds) {
            return Err(GameError::InvalidCoords);
        }
        if goal == START || walls.contains(&START) || traps.contains(&START) {
            return Err(GameError::StartNotClear);
        }

        let mut cells: Array2<CellKind> = Array2::default(size.to_nd_index());
        let placements = walls
            .iter()
            .map(|&pos| (pos, CellKind::Wall))
            .chain(traps.iter().map(|&pos| (pos, CellKind::Trap)))
            .chain([(goal, CellKind::Goal)]);
        for (pos, kind) in placements {
            let cell = &mut cells[pos.to_nd_index()];
            if *cell != CellKind::Empty {
                return Err(GameError::OverlappingCells);
            }
            *cell = kind;
        }

        Ok(Self::from_cells(cells, goal))
    }

    pub fn contains(&self, (row, col): Position) -> bool {
        let (rows, cols) = self.size();
        row < rows && col < cols
    }

    pub fn size(&self) -> Position {
        let (rows, cols) = self.cells.dim();
        // dimensions always come from a `Position`, so they fit
        (rows as Coord, cols as Coord)
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    pub fn trap_count(&self) -> CellCount {
        self.trap_count
    }

    pub fn kind_at(&self, coords: Position) -> CellKind {
        self[coords]
    }

    /// Positions of all cells of `kind`, in row-major order.
    pub fn positions_of(&self, kind: CellKind) -> Vec<Position> {
        self.cells
            .indexed_iter()
            .filter(|&(_, &cell)| cell == kind)
            .map(|((row, col), _)| (row as Coord, col as Coord))
            .collect()
    }
}

/// Unchecked shape of a serialized [`Maze`].
#[derive(Deserialize)]
struct MazeRecord {
    cells: Array2<CellKind>,
    goal: Position,
}

impl TryFrom<MazeRecord> for Maze {
    type Error = GameError;

    fn try_from(record: MazeRecord) -> Result<Self> {
        let (rows, cols) = record.cells.dim();
        let (Ok(rows), Ok(cols)) = (Coord::try_from(rows), Coord::try_from(cols)) else {
            return Err(GameError::InvalidSize);
        };
        if rows == 0 || cols == 0 || mult(rows, cols) < 2 {
            return Err(GameError::InvalidSize);
        }

        let (goal_row, goal_col) = record.goal;
        if goal_row >= rows || goal_col >= cols {
            return Err(GameError::InvalidCoords);
        }
        if record.cells[START.to_nd_index()] != CellKind::Empty {
            return Err(GameError::StartNotClear);
        }

        let maze = Self::from_cells(record.cells, record.goal);
        if maze.positions_of(CellKind::Goal) != [maze.goal] {
            return Err(GameError::GoalMismatch);
        }
        Ok(maze)
    }
}

impl Index<Position> for Maze {
    type Output = CellKind;

    fn index(&self, (row, col): Position) -> &Self::Output {
        &self.cells[(row as usize, col as usize)]
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Out of bounds, into a wall, or the session is already over.
    NoChange,
    Moved,
    SprungTrap,
    Won,
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        use MoveOutcome::*;
        match self {
            NoChange => false,
            Moved => true,
            SprungTrap => true,
            Won => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session already over, or the heartbeat belongs to an older session.
    NoChange,
    Counted,
    Expired,
}

impl TickOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}
