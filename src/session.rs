//! Game session state: participants, board, turn ownership, lifecycle.

use crate::game::{Board, GameState, Player};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Unique identifier for a game session.
pub type SessionId = String;

/// The quorum: how many seats a session has.
pub const MAX_PLAYERS: usize = 2;

/// A two-player game session.
///
/// The session exclusively owns its board; the board lives exactly as long
/// as the session. The winner is `Some` if and only if the state is
/// [`GameState::PlayerWon`].
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Session id, derived from the host name and creation time.
    pub id: SessionId,
    /// Display name of the hosting side.
    pub host_name: String,
    /// Participant display names in join order. At most two, unique.
    pub players: Vec<String>,
    /// The board.
    pub board: Board,
    /// Whose turn it is.
    pub current_player: Player,
    /// Lifecycle state.
    pub state: GameState,
    /// The winner, set iff `state` is `PlayerWon`.
    pub winner: Option<Player>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    /// Creates a fresh session waiting for participants, Red to move.
    pub fn new(host_name: impl Into<String>) -> Self {
        let host_name = host_name.into();
        let created_at = Utc::now();
        let id = format!("{}-{}", host_name, created_at.timestamp_millis());
        info!(session_id = %id, "created game session");
        Self {
            id,
            host_name,
            players: Vec::new(),
            board: Board::new(),
            current_player: Player::Red,
            state: GameState::WaitingForPlayers,
            winner: None,
            created_at,
        }
    }

    /// Seats a participant. Rejects a duplicate name and a third seat.
    pub fn add_player(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.players.len() >= MAX_PLAYERS {
            debug!(player = %name, "session already has two players");
            return false;
        }
        if self.players.iter().any(|p| p == &name) {
            debug!(player = %name, "player already seated");
            return false;
        }
        info!(player = %name, seats = self.players.len() + 1, "player seated");
        self.players.push(name);
        true
    }

    /// Removes a participant by name.
    pub fn remove_player(&mut self, name: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p != name);
        self.players.len() < before
    }

    /// True once both seats are taken.
    pub fn has_quorum(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    /// Starts play.
    pub fn begin(&mut self) {
        self.state = GameState::InProgress;
    }

    /// Records a win for `player`.
    pub fn finish_win(&mut self, player: Player) {
        self.state = GameState::PlayerWon;
        self.winner = Some(player);
    }

    /// Records a draw.
    pub fn finish_draw(&mut self) {
        self.state = GameState::GameOver;
        self.winner = None;
    }

    /// Hands the turn to the other player.
    pub fn advance_turn(&mut self) {
        self.current_player = self.current_player.other();
    }
}
