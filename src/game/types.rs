//! Core domain types for Connect Four.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A player in the game.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum Player {
    /// Red pieces; the hosting side, moves first.
    Red,
    /// Yellow pieces; the joining side.
    Yellow,
}

impl Player {
    /// Returns the opposing player.
    pub fn other(self) -> Self {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }
}

/// One cell of the board grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// No piece.
    Empty,
    /// A piece placed by a player.
    Occupied(Player),
}

/// Lifecycle state of a game session. Exactly one is active at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
pub enum GameState {
    /// Waiting for a second participant.
    WaitingForPlayers,
    /// Both seats taken, moves being exchanged.
    InProgress,
    /// Board filled with no winner: a draw. Terminal.
    GameOver,
    /// A player connected four. Terminal; the session records the winner.
    PlayerWon,
}

/// A completed placement. Immutable once created; produced only by a
/// successful drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMove {
    /// Target column.
    pub column: usize,
    /// The player who placed the piece.
    pub player: Player,
    /// When the placement happened.
    pub timestamp: DateTime<Utc>,
}
