use alloc::collections::{BTreeSet, VecDeque};
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        Self::InProgress
    }
}

/// Identifies one play-through, strictly increasing across resets of the same engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn get(self) -> u64 {
        self.0
    }

    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Permission for an external heartbeat to tick one specific session.
///
/// Ticks carrying a token from a superseded session are ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeartbeatToken {
    session: SessionId,
}

/// Mutable state of a single play-through, from one `reset` to the next.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionRecord")]
pub struct Session {
    id: SessionId,
    maze: Maze,
    player: Position,
    revealed_traps: BTreeSet<Position>,
    initial_secs: u32,
    remaining_secs: u32,
    status: GameStatus,
    move_count: u32,
}

impl Session {
    fn new(id: SessionId, maze: Maze, initial_secs: u32) -> Self {
        Self {
            id,
            maze,
            player: START,
            revealed_traps: BTreeSet::new(),
            initial_secs,
            remaining_secs: initial_secs,
            status: Default::default(),
            move_count: 0,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn size(&self) -> Position {
        self.maze.size()
    }

    pub fn player_position(&self) -> Position {
        self.player
    }

    pub fn goal_position(&self) -> Position {
        self.maze.goal()
    }

    pub fn revealed_traps(&self) -> &BTreeSet<Position> {
        &self.revealed_traps
    }

    pub fn is_trap_revealed(&self, coords: Position) -> bool {
        self.revealed_traps.contains(&coords)
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.initial_secs.saturating_sub(self.remaining_secs)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn visible_cell_at(&self, coords: Position) -> VisibleCell {
        VisibleCell::from_kind(self.maze[coords], self.is_trap_revealed(coords))
    }

    fn apply_move(
        &mut self,
        direction: Direction,
        events: &mut VecDeque<GameEvent>,
    ) -> MoveOutcome {
        if self.is_finished() {
            log::trace!("move {:?} ignored, game is over", direction);
            return MoveOutcome::NoChange;
        }

        let Some(next) = direction.step(self.player, self.maze.size()) else {
            log::trace!("move {:?} from {:?} blocked by border", direction, self.player);
            return MoveOutcome::NoChange;
        };
        if !self.maze[next].is_passable() {
            log::trace!("move {:?} from {:?} blocked by wall", direction, self.player);
            return MoveOutcome::NoChange;
        }

        let from = self.player;
        self.player = next;
        self.move_count += 1;

        if next == self.maze.goal() {
            log::debug!("goal reached at {:?}", next);
            self.status = GameStatus::Won;
            events.push_back(GameEvent::Won { at: next });
            MoveOutcome::Won
        } else if self.maze[next] == CellKind::Trap {
            log::debug!("trap sprung at {:?}", next);
            self.status = GameStatus::Lost;
            self.revealed_traps.insert(next);
            events.push_back(GameEvent::TrapSprung { at: next });
            MoveOutcome::SprungTrap
        } else {
            events.push_back(GameEvent::Moved { from, to: next });
            MoveOutcome::Moved
        }
    }

    fn apply_tick(&mut self, events: &mut VecDeque<GameEvent>) -> TickOutcome {
        if self.is_finished() {
            return TickOutcome::NoChange;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            log::debug!("time is up");
            self.status = GameStatus::Lost;
            events.push_back(GameEvent::TimeUp);
            TickOutcome::Expired
        } else {
            TickOutcome::Counted
        }
    }
}

/// Unchecked shape of a serialized [`Session`].
#[derive(Deserialize)]
struct SessionRecord {
    id: SessionId,
    maze: Maze,
    player: Position,
    revealed_traps: BTreeSet<Position>,
    initial_secs: u32,
    remaining_secs: u32,
    status: GameStatus,
    move_count: u32,
}

impl TryFrom<SessionRecord> for Session {
    type Error = GameError;

    fn try_from(record: SessionRecord) -> Result<Self> {
        let maze = record.maze;
        if !maze.contains(record.player) {
            return Err(GameError::InvalidCoords);
        }
        if !maze[record.player].is_passable() || record.remaining_secs > record.initial_secs {
            return Err(GameError::InvalidSession);
        }
        let traps_only = record
            .revealed_traps
            .iter()
            .all(|&pos| maze.contains(pos) && maze[pos] == CellKind::Trap);
        if !traps_only {
            return Err(GameError::InvalidSession);
        }

        Ok(Self {
            id: record.id,
            maze,
            player: record.player,
            revealed_traps: record.revealed_traps,
            initial_secs: record.initial_secs,
            remaining_secs: record.remaining_secs,
            status: record.status,
            move_count: record.move_count,
        })
    }
}

/// Owns the current session and the generator used to replace it.
///
/// The engine never keeps time itself: an outside heartbeat calls [`GameEngine::tick`] (or
/// [`GameEngine::tick_for`]) once per second.
#[derive(Clone, Debug)]
pub struct GameEngine<G = RandomMazeGenerator> {
    config: GameConfig,
    generator: G,
    session: Session,
    events: VecDeque<GameEvent>,
}

impl GameEngine<RandomMazeGenerator> {
    pub fn from_seed(config: GameConfig, seed: u64) -> Result<Self> {
        Self::new(config, RandomMazeGenerator::from_seed(seed))
    }
}

impl<G: MazeGenerator> GameEngine<G> {
    /// Validates `config` and starts the first session.
    pub fn new(config: GameConfig, mut generator: G) -> Result<Self> {
        config.validate()?;
        let maze = generator.generate(&config);
        let session = Session::new(SessionId(0), maze, config.initial_secs);
        log::debug!("session {} started", session.id.get());
        Ok(Self {
            config,
            generator,
            session,
            events: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn maze(&self) -> &Maze {
        self.session.maze()
    }

    pub fn player_position(&self) -> Position {
        self.session.player_position()
    }

    pub fn goal_position(&self) -> Position {
        self.session.goal_position()
    }

    pub fn revealed_traps(&self) -> &BTreeSet<Position> {
        self.session.revealed_traps()
    }

    pub fn remaining_secs(&self) -> u32 {
        self.session.remaining_secs()
    }

    pub fn status(&self) -> GameStatus {
        self.session.status()
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub fn visible_cell_at(&self, coords: Position) -> VisibleCell {
        self.session.visible_cell_at(coords)
    }

    /// Token for ticking the current session, `None` once it has ended.
    pub fn heartbeat(&self) -> Option<HeartbeatToken> {
        if self.session.is_finished() {
            None
        } else {
            Some(HeartbeatToken {
                session: self.session.id,
            })
        }
    }

    pub fn move_player(&mut self, direction: Direction) -> MoveOutcome {
        self.session.apply_move(direction, &mut self.events)
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.session.apply_tick(&mut self.events)
    }

    pub fn tick_for(&mut self, token: HeartbeatToken) -> TickOutcome {
        if token.session != self.session.id {
            log::debug!(
                "stale heartbeat for session {} ignored, current is {}",
                token.session.get(),
                self.session.id.get()
            );
            return TickOutcome::NoChange;
        }
        self.tick()
    }

    /// Replaces the session with a freshly generated one, invalidating earlier heartbeat tokens.
    ///
    /// Events not yet drained from the old session are discarded.
    pub fn reset(&mut self) -> HeartbeatToken {
        let id = self.session.id.next();
        let maze = self.generator.generate(&self.config);
        self.session = Session::new(id, maze, self.config.initial_secs);
        self.events.clear();
        log::debug!("session {} started", id.get());
        HeartbeatToken { session: id }
    }

    /// Takes all notifications produced since the last call, oldest first.
    pub fn drain_events(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    struct FixedMaze(Maze);

    impl MazeGenerator for FixedMaze {
        fn generate(&mut self, _config: &GameConfig) -> Maze {
            self.0.clone()
        }
    }

    fn engine(
        size: Position,
        walls: &[Position],
        traps: &[Position],
        goal: Position,
    ) -> GameEngine<FixedMaze> {
        let maze = Maze::from_layout(size, walls, traps, goal).unwrap();
        let config =
            GameConfig::new(size, maze.trap_count(), INITIAL_SECONDS, GoalPlacement::Fixed)
                .unwrap();
        GameEngine::new(config, FixedMaze(maze)).unwrap()
    }

    fn classic(walls: &[Position], traps: &[Position]) -> GameEngine<FixedMaze> {
        engine((10, 10), walls, traps, (9, 9))
    }

    #[test]
    fn fresh_session_starts_in_corner() {
        let engine = classic(&[], &[]);

        assert_eq!(engine.status(), GameStatus::InProgress);
        assert_eq!(engine.player_position(), (0, 0));
        assert_eq!(engine.goal_position(), (9, 9));
        assert_eq!(engine.remaining_secs(), 30);
        assert!(engine.revealed_traps().is_empty());
    }

    #[test]
    fn wall_blocks_move() {
        let mut engine = classic(&[(0, 1)], &[]);

        assert_eq!(engine.move_player(Direction::Right), MoveOutcome::NoChange);
        assert_eq!(engine.player_position(), (0, 0));
        assert_eq!(engine.status(), GameStatus::InProgress);
        assert_eq!(engine.drain_events().count(), 0);
    }

    #[test]
    fn border_blocks_move() {
        let mut engine = classic(&[], &[]);

        assert_eq!(engine.move_player(Direction::Up), MoveOutcome::NoChange);
        assert_eq!(engine.move_player(Direction::Left), MoveOutcome::NoChange);
        assert_eq!(engine.player_position(), (0, 0));
        assert_eq!(engine.session().move_count(), 0);
    }

    #[test]
    fn empty_cell_moves_player_and_emits_event() {
        let mut engine = classic(&[], &[]);

        assert_eq!(engine.move_player(Direction::Down), MoveOutcome::Moved);
        assert_eq!(engine.move_player(Direction::Right), MoveOutcome::Moved);

        assert_eq!(engine.player_position(), (1, 1));
        let events: Vec<_> = engine.drain_events().collect();
        assert_eq!(
            events,
            [
                GameEvent::Moved {
                    from: (0, 0),
                    to: (1, 0)
                },
                GameEvent::Moved {
                    from: (1, 0),
                    to: (1, 1)
                },
            ]
        );
        assert_eq!(engine.drain_events().count(), 0);
    }

    #[test]
    fn trap_ends_game_and_reveals_only_that_trap() {
        let mut engine = classic(&[], &[(0, 2), (5, 5)]);

        assert_eq!(engine.visible_cell_at((0, 2)), VisibleCell::Empty);
        engine.move_player(Direction::Right);
        let outcome = engine.move_player(Direction::Right);

        assert_eq!(outcome, MoveOutcome::SprungTrap);
        assert_eq!(engine.status(), GameStatus::Lost);
        assert_eq!(engine.player_position(), (0, 2));
        assert_eq!(engine.revealed_traps().iter().copied().collect::<Vec<_>>(), [(0, 2)]);
        assert_eq!(engine.visible_cell_at((0, 2)), VisibleCell::Trap);
        assert_eq!(engine.visible_cell_at((5, 5)), VisibleCell::Empty);
        assert_eq!(
            engine.drain_events().last(),
            Some(GameEvent::TrapSprung { at: (0, 2) })
        );
    }

    #[test]
    fn nothing_changes_after_trap() {
        let mut engine = classic(&[], &[(0, 1)]);
        engine.move_player(Direction::Right);

        assert_eq!(engine.move_player(Direction::Down), MoveOutcome::NoChange);
        assert_eq!(engine.tick(), TickOutcome::NoChange);
        assert_eq!(engine.player_position(), (0, 1));
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(engine.revealed_traps().len(), 1);
        assert_eq!(engine.heartbeat(), None);
    }

    #[test]
    fn reaching_goal_wins_and_is_terminal() {
        let mut engine = engine((2, 2), &[(0, 1)], &[], (1, 1));

        assert_eq!(engine.move_player(Direction::Down), MoveOutcome::Moved);
        assert_eq!(engine.move_player(Direction::Right), MoveOutcome::Won);

        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(engine.player_position(), (1, 1));
        assert_eq!(engine.move_player(Direction::Left), MoveOutcome::NoChange);
        assert_eq!(engine.tick(), TickOutcome::NoChange);
        assert_eq!(engine.player_position(), (1, 1));
        assert_eq!(engine.status(), GameStatus::Won);
        assert_eq!(
            engine.drain_events().last(),
            Some(GameEvent::Won { at: (1, 1) })
        );
    }

    #[test]
    fn countdown_expires_on_the_tick_reaching_zero() {
        let mut engine = classic(&[], &[]);

        for _ in 0..29 {
            assert_eq!(engine.tick(), TickOutcome::Counted);
        }
        assert_eq!(engine.remaining_secs(), 1);
        assert_eq!(engine.status(), GameStatus::InProgress);

        assert_eq!(engine.tick(), TickOutcome::Expired);
        assert_eq!(engine.remaining_secs(), 0);
        assert_eq!(engine.status(), GameStatus::Lost);
        assert_eq!(engine.session().elapsed_secs(), 30);
        assert_eq!(engine.drain_events().collect::<Vec<_>>(), [GameEvent::TimeUp]);

        assert_eq!(engine.tick(), TickOutcome::NoChange);
        assert_eq!(engine.remaining_secs(), 0);
    }

    #[test]
    fn zero_second_timer_expires_on_first_tick() {
        let maze = Maze::from_layout((2, 2), &[], &[], (1, 1)).unwrap();
        let config = GameConfig::new((2, 2), 0, 0, GoalPlacement::Fixed).unwrap();
        let mut engine = GameEngine::new(config, FixedMaze(maze)).unwrap();

        assert_eq!(engine.tick(), TickOutcome::Expired);
        assert_eq!(engine.status(), GameStatus::Lost);
    }

    #[test]
    fn reset_restores_fresh_session() {
        let mut engine = classic(&[], &[(0, 1)]);
        engine.tick();
        engine.move_player(Direction::Right);
        assert_eq!(engine.status(), GameStatus::Lost);
        let old_id = engine.session().id();

        engine.reset();

        assert_eq!(engine.status(), GameStatus::InProgress);
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(engine.player_position(), (0, 0));
        assert!(engine.revealed_traps().is_empty());
        assert_eq!(engine.session().move_count(), 0);
        assert!(engine.session().id() > old_id);
        assert_eq!(engine.drain_events().count(), 0);
    }

    #[test]
    fn stale_heartbeat_cannot_tick_new_session() {
        let mut engine = classic(&[], &[]);
        let old = engine.heartbeat().unwrap();
        assert_eq!(engine.tick_for(old), TickOutcome::Counted);

        let current = engine.reset();

        assert_eq!(engine.tick_for(old), TickOutcome::NoChange);
        assert_eq!(engine.remaining_secs(), 30);
        assert_eq!(engine.tick_for(current), TickOutcome::Counted);
        assert_eq!(engine.remaining_secs(), 29);
        assert_eq!(engine.heartbeat(), Some(current));
    }

    #[test]
    fn reset_draws_a_new_maze() {
        let mut engine = GameEngine::from_seed(GameConfig::CLASSIC, 9).unwrap();
        let first = engine.maze().clone();

        engine.reset();

        assert_ne!(engine.maze(), &first);
        assert_eq!(engine.maze().trap_count(), 15);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = GameConfig::new_unchecked((2, 2), 3, 30, GoalPlacement::Fixed);

        let result = GameEngine::from_seed(config, 0);

        assert!(matches!(result, Err(GameError::TooManyTraps { .. })));
    }

    #[test]
    fn session_snapshot_serializes() {
        let mut engine = classic(&[], &[(1, 0)]);
        engine.move_player(Direction::Down);

        let json = serde_json::to_string(engine.session()).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(&back, engine.session());
        assert!(back.is_trap_revealed((1, 0)));
    }

    #[test]
    fn loading_session_rejects_inconsistent_state() {
        let engine = classic(&[(0, 1)], &[(1, 0)]);
        let json = serde_json::to_value(engine.session()).unwrap();
        let load = |patch: fn(&mut serde_json::Value)| {
            let mut value = json.clone();
            patch(&mut value);
            serde_json::from_value::<Session>(value)
        };

        assert!(load(|_| {}).is_ok());
        assert!(load(|v| v["remaining_secs"] = serde_json::json!(31)).is_err());
        assert!(load(|v| v["player"] = serde_json::json!([50, 50])).is_err());
        assert!(load(|v| v["player"] = serde_json::json!([0, 1])).is_err());
        assert!(load(|v| v["revealed_traps"] = serde_json::json!([[2, 2]])).is_err());
        assert!(load(|v| v["maze"]["goal"] = serde_json::json!([10, 10])).is_err());
    }
}
