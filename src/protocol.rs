//! Wire protocol: the tagged message envelope and its JSON codec.

use crate::error::DecodeError;
use crate::game::{GameMove, GameState, Player};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the logical game service on the shared transport.
pub const SERVICE_ID: &str = "12345678-1234-1234-1234-123456789abc";

/// Identifier of the single channel all game messages flow over.
pub const MESSAGE_CHARACTERISTIC_ID: &str = "87654321-4321-4321-4321-cba987654321";

/// Advertised-name prefix. Hosts advertise `prefix + name`; scans filter on
/// the same prefix to scope discovery to this game.
pub const GAME_NAME_PREFIX: &str = "Connect4-";

/// A message exchanged between the two peers.
///
/// `Move` carries the sender's entire post-move session snapshot rather than
/// just the delta, so the receiving side converges on identical state
/// instead of recomputing it independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PeerMessage {
    /// A guest announcing itself after connecting.
    #[serde(rename_all = "camelCase")]
    JoinGame {
        /// Display name of the joining player.
        player_id: String,
        /// When the join was issued.
        timestamp: DateTime<Utc>,
    },
    /// A relayed move plus the sender's authoritative post-move state.
    #[serde(rename_all = "camelCase")]
    Move {
        /// The placement that was made.
        #[serde(rename = "move")]
        game_move: GameMove,
        /// The sender's lifecycle state after the move.
        state: GameState,
        /// The sender's current player after the move.
        current_player: Player,
        /// The sender's winner after the move, if any.
        winner: Option<Player>,
    },
}

impl PeerMessage {
    /// Encodes the message as its UTF-8 JSON envelope.
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("peer message is always serializable")
    }

    /// Decodes an envelope.
    ///
    /// # Errors
    ///
    /// Malformed input or an unknown `type` tag. The receive path logs these
    /// and drops the message; it never dies on bad input.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(bytes).map_err(DecodeError::from)
    }
}
