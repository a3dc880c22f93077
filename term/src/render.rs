use crate::game;
use crossterm::QueueableCommand;
use crossterm::cursor::MoveTo;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use game::{GameEvent, GameStatus, Position, Session, VisibleCell};
use std::io::{self, Write};

const CELL_W: u16 = 2;
const GRID_TOP: u16 = 3;

/// Terminal stand-ins for the sound and particle effects: a bell and a banner line.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Effects {
    bell: bool,
    banner: Option<String>,
}

impl Effects {
    pub(crate) fn observe(&mut self, event: GameEvent) {
        match event {
            GameEvent::Moved { .. } => {}
            GameEvent::TrapSprung { at: (row, col) } => {
                self.bell = true;
                let (row, col) = (u16::from(row) + 1, u16::from(col) + 1);
                self.banner = Some(format!("You stepped on a trap at row {row}, column {col}"));
            }
            GameEvent::Won { .. } => {
                self.bell = true;
                self.banner = Some("*  .  *  .  *  Congratulations!  *  .  *  .  *".to_string());
            }
            GameEvent::TimeUp => {
                self.bell = true;
                self.banner = Some("Out of time".to_string());
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Glyph {
    Player,
    Goal,
    Wall,
    Trap,
    Empty,
}

impl Glyph {
    fn at(session: &Session, coords: Position) -> Self {
        if session.player_position() == coords {
            return Self::Player;
        }
        match session.visible_cell_at(coords) {
            VisibleCell::Goal => Self::Goal,
            VisibleCell::Wall => Self::Wall,
            VisibleCell::Trap => Self::Trap,
            VisibleCell::Empty => Self::Empty,
        }
    }

    fn style(self) -> (Color, &'static str) {
        match self {
            Self::Player => (Color::Yellow, "@"),
            Self::Goal => (Color::Green, "G"),
            Self::Wall => (Color::DarkGrey, "#"),
            Self::Trap => (Color::Red, "X"),
            Self::Empty => (Color::Grey, "."),
        }
    }
}

fn headline(session: &Session) -> String {
    match session.status() {
        GameStatus::InProgress => format!("Time Remaining: {}", session.remaining_secs()),
        GameStatus::Lost => "Game Over!".to_string(),
        GameStatus::Won => "You Won!".to_string(),
    }
}

fn footer(session: &Session) -> &'static str {
    if session.is_finished() {
        "r: Play Again   q: quit"
    } else {
        "arrows / wasd / hjkl: move   r: restart   q: quit"
    }
}

pub(crate) fn draw<W: Write>(
    out: &mut W,
    session: &Session,
    effects: &mut Effects,
) -> io::Result<()> {
    out.queue(MoveTo(0, 0))?;
    out.queue(Clear(ClearType::All))?;
    out.queue(Print("Maze Game"))?;
    out.queue(MoveTo(0, 1))?;
    out.queue(Print(headline(session)))?;

    let (rows, cols) = session.size();
    for row in 0..rows {
        out.queue(MoveTo(0, GRID_TOP + u16::from(row)))?;
        for col in 0..cols {
            let (color, text) = Glyph::at(session, (row, col)).style();
            out.queue(SetForegroundColor(color))?;
            out.queue(Print(format!("{:<width$}", text, width = CELL_W as usize)))?;
        }
        out.queue(ResetColor)?;
    }

    let mut line = GRID_TOP + u16::from(rows) + 1;
    if let Some(banner) = &effects.banner {
        out.queue(MoveTo(0, line))?;
        out.queue(Print(banner))?;
        line += 1;
    }
    out.queue(MoveTo(0, line))?;
    out.queue(Print(format!(
        "moves: {}   {}",
        session.move_count(),
        footer(session)
    )))?;

    if std::mem::take(&mut effects.bell) {
        out.queue(Print('\x07'))?;
    }
    out.flush()
}
