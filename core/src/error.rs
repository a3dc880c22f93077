use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Grid must have at least two cells")]
    InvalidSize,
    #[error("Too many traps, requested {requested} but only {available} cells are free")]
    TooManyTraps {
        requested: crate::CellCount,
        available: crate::CellCount,
    },
    #[error("Start cell must stay clear")]
    StartNotClear,
    #[error("Cell is assigned more than one kind")]
    OverlappingCells,
    #[error("Goal cell does not match the goal position")]
    GoalMismatch,
    #[error("Saved session is inconsistent with its maze")]
    InvalidSession,
}

pub type Result<T> = core::result::Result<T, GameError>;
