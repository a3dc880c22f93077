use serde::{Deserialize, Serialize};

/// Static terrain of a grid cell, fixed for the lifetime of a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Wall,
    Trap,
    Goal,
}

impl CellKind {
    pub const fn is_passable(self) -> bool {
        !matches!(self, Self::Wall)
    }
}

impl Default for CellKind {
    fn default() -> Self {
        Self::Empty
    }
}

/// What the player is allowed to see of a cell.
///
/// Traps look like ordinary floor until they have been stepped on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibleCell {
    Empty,
    Wall,
    Goal,
    Trap,
}

impl VisibleCell {
    pub const fn from_kind(kind: CellKind, revealed: bool) -> Self {
        match kind {
            CellKind::Empty => Self::Empty,
            CellKind::Wall => Self::Wall,
            CellKind::Goal => Self::Goal,
            CellKind::Trap if revealed => Self::Trap,
            CellKind::Trap => Self::Empty,
        }
    }
}
