use serde::{Deserialize, Serialize};

use crate::*;

/// Advisory notification for side-effecting observers (sound, particles, banners).
///
/// Events are not part of the state contract: dropping them never changes the game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Moved { from: Position, to: Position },
    TrapSprung { at: Position },
    Won { at: Position },
    TimeUp,
}
