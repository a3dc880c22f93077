use crate::game;
use crate::render::{self, Effects};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use game::{Direction, GameEngine, HeartbeatToken, MazeGenerator};
use std::io::Stdout;
use std::time::{Duration, Instant};

/// Poll interval while no session is running.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Command {
    Move(Direction),
    Reset,
    Quit,
}

impl Command {
    fn from_key(key: KeyEvent) -> Option<Self> {
        use Direction::*;

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return matches!(key.code, KeyCode::Char('c')).then_some(Self::Quit);
        }

        Some(match key.code {
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Self::Move(Up),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Self::Move(Down),
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Self::Move(Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Self::Move(Right),
            KeyCode::Char('r') | KeyCode::Enter => Self::Reset,
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            _ => return None,
        })
    }
}

/// One-second countdown driver bound to a single session.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Heartbeat {
    token: HeartbeatToken,
    next_at: Instant,
}

impl Heartbeat {
    const PERIOD: Duration = Duration::from_secs(1);

    fn start(token: HeartbeatToken, now: Instant) -> Self {
        Self {
            token,
            next_at: now + Self::PERIOD,
        }
    }

    fn wait(&self, now: Instant) -> Duration {
        self.next_at.saturating_duration_since(now)
    }

    fn is_due(&self, now: Instant) -> bool {
        now >= self.next_at
    }

    fn rearm(&mut self) {
        self.next_at += Self::PERIOD;
    }
}

/// Applies a non-quit command. Returns whether anything on screen changed.
fn apply<G: MazeGenerator>(
    engine: &mut GameEngine<G>,
    heartbeat: &mut Option<Heartbeat>,
    command: Command,
    now: Instant,
) -> bool {
    match command {
        Command::Quit => false,
        Command::Reset => {
            *heartbeat = Some(Heartbeat::start(engine.reset(), now));
            true
        }
        Command::Move(direction) => {
            let outcome = engine.move_player(direction);
            log::debug!("move {:?}: {:?}", direction, outcome);
            outcome.has_update()
        }
    }
}

/// Ticks the engine if the heartbeat is due, and stops it once its session is over.
fn advance_clock<G: MazeGenerator>(
    engine: &mut GameEngine<G>,
    heartbeat: &mut Option<Heartbeat>,
    now: Instant,
) -> bool {
    let mut changed = false;
    if let Some(beat) = heartbeat.as_mut() {
        if beat.is_due(now) {
            changed = engine.tick_for(beat.token).has_update();
            beat.rearm();
        }
    }
    if heartbeat.is_some_and(|beat| engine.heartbeat() != Some(beat.token)) {
        log::debug!("session over, stopping heartbeat");
        *heartbeat = None;
    }
    changed
}

pub(crate) fn run<G: MazeGenerator>(
    stdout: &mut Stdout,
    engine: &mut GameEngine<G>,
) -> anyhow::Result<()> {
    let mut heartbeat = engine
        .heartbeat()
        .map(|token| Heartbeat::start(token, Instant::now()));
    let mut effects = Effects::default();

    render::draw(stdout, engine.session(), &mut effects)?;

    loop {
        let wait = heartbeat.map_or(IDLE_POLL, |beat| beat.wait(Instant::now()));
        let mut dirty = false;
        if event::poll(wait)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    log::trace!("key {:?}", key);
                    match Command::from_key(key) {
                        Some(Command::Quit) => return Ok(()),
                        Some(command) => {
                            if command == Command::Reset {
                                effects.clear();
                            }
                            dirty |= apply(engine, &mut heartbeat, command, Instant::now());
                        }
                        None => {}
                    }
                }
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }

        dirty |= advance_clock(engine, &mut heartbeat, Instant::now());

        for event in engine.drain_events() {
            effects.observe(event);
            dirty = true;
        }
        if dirty {
            render::draw(stdout, engine.session(), &mut effects)?;
        }
    }
}
