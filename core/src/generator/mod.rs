use alloc::boxed::Box;

use crate::*;
pub use random::*;

mod random;

/// Chance for any non-reserved cell to become a wall.
pub const WALL_PROBABILITY: f64 = 0.2;

/// Random draws spent looking for a free cell before scanning for one exhaustively.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 1024;

pub trait MazeGenerator {
    fn generate(&mut self, config: &GameConfig) -> Maze;
}

impl<G: MazeGenerator + ?Sized> MazeGenerator for Box<G> {
    fn generate(&mut self, config: &GameConfig) -> Maze {
        (**self).generate(config)
    }
}
