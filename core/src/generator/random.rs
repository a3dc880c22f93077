use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::SmallRng;

use super::*;

/// Generation strategy with independent walls, then rejection-sampled traps, then the goal.
///
/// No path from start to goal is guaranteed.
#[derive(Clone, Debug)]
pub struct RandomMazeGenerator<R = SmallRng> {
    rng: R,
    wall_probability: f64,
}

impl RandomMazeGenerator<SmallRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomMazeGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            wall_probability: WALL_PROBABILITY,
        }
    }

    pub fn with_wall_probability(mut self, wall_probability: f64) -> Self {
        let wall_probability = if wall_probability.is_nan() {
            WALL_PROBABILITY
        } else {
            wall_probability
        };
        self.wall_probability = wall_probability.clamp(0.0, 1.0);
        self
    }

    /// Picks a cell accepted by `preferred`, or by `fallback` once no preferred cell is left.
    fn place(
        &mut self,
        cells: &Array2<CellKind>,
        preferred: impl Fn(Position, CellKind) -> bool,
        fallback: impl Fn(Position, CellKind) -> bool,
    ) -> Option<Position> {
        let (rows, cols) = cells.dim();

        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let pos = (
                self.rng.random_range(0..rows) as Coord,
                self.rng.random_range(0..cols) as Coord,
            );
            if preferred(pos, cells[pos.to_nd_index()]) {
                return Some(pos);
            }
        }

        log::debug!(
            "No free cell after {} draws, scanning instead",
            MAX_PLACEMENT_ATTEMPTS
        );
        self.pick_uniform(cells, &preferred).or_else(|| {
            log::warn!("Not enough empty cells left, knocking down a wall");
            self.pick_uniform(cells, &fallback)
        })
    }

    fn pick_uniform(
        &mut self,
        cells: &Array2<CellKind>,
        accept: &impl Fn(Position, CellKind) -> bool,
    ) -> Option<Position> {
        let candidates = || {
            cells
                .indexed_iter()
                .map(|((row, col), &kind)| ((row as Coord, col as Coord), kind))
                .filter(|&(pos, kind)| accept(pos, kind))
                .map(|(pos, _)| pos)
        };

        let count = candidates().count();
        if count == 0 {
            return None;
        }
        let nth = self.rng.random_range(0..count);
        candidates().nth(nth)
    }
}

impl<R: Rng> MazeGenerator for RandomMazeGenerator<R> {
    fn generate(&mut self, config: &GameConfig) -> Maze {
        use CellKind::*;

        let corner = config.corner();
        let fixed_goal = matches!(config.goal_placement, GoalPlacement::Fixed);
        let reserved = move |pos: Position| pos == START || (fixed_goal && pos == corner);

        let traps = if config.traps > config.trap_capacity() {
            log::warn!(
                "Too many traps, requested {} but only fits {}",
                config.traps,
                config.trap_capacity()
            );
            config.trap_capacity()
        } else {
            config.traps
        };

        let mut cells: Array2<CellKind> = Array2::default(config.size.to_nd_index());
        for ((row, col), cell) in cells.indexed_iter_mut() {
            let pos = (row as Coord, col as Coord);
            if !reserved(pos) && self.rng.random_bool(self.wall_probability) {
                *cell = Wall;
            }
        }

        for placed in 0..traps {
            let Some(pos) = self.place(
                &cells,
                |pos, kind| kind == Empty && !reserved(pos),
                |pos, kind| kind == Wall && !reserved(pos),
            ) else {
                log::warn!("Placed only {} of {} traps", placed, traps);
                break;
            };
            cells[pos.to_nd_index()] = Trap;
        }

        let goal = if fixed_goal {
            corner
        } else {
            self.place(
                &cells,
                |pos, kind| kind == Empty && pos != START,
                |pos, kind| kind == Wall && pos != START,
            )
            .unwrap_or_else(|| {
                log::warn!("No cell left for the goal, using the corner");
                corner
            })
        };
        cells[goal.to_nd_index()] = Goal;

        let maze = Maze::from_cells(cells, goal);
        log::debug!(
            "Generated {:?} maze, {} walls, {} traps, goal at {:?}",
            maze.size(),
            maze.positions_of(Wall).len(),
            maze.trap_count(),
            maze.goal()
        );
        maze
    }
}
