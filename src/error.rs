//! Error taxonomy: declined moves, transport failures, decode failures.

use derive_more::{Display, Error, From};

/// A declined placement or session-rule violation.
///
/// These are recoverable values, never panics: the board and session are
/// left untouched and the caller may simply re-issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveError {
    /// Column index outside the board.
    #[display("column {column} is out of range")]
    InvalidColumn {
        /// The rejected column index.
        column: usize,
    },
    /// Column already holds six pieces.
    #[display("column {column} is full")]
    ColumnFull {
        /// The rejected column index.
        column: usize,
    },
    /// The issuing side does not own the current turn.
    #[display("not your turn")]
    NotYourTurn,
    /// No game is in progress.
    #[display("game is not in progress")]
    GameNotInProgress,
}

/// A transport failure, reported synchronously to the initiating call.
/// Nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum LinkError {
    /// The underlying transport is not ready.
    #[display("transport unavailable")]
    TransportUnavailable,
    /// Connecting to the chosen peer failed.
    #[display("connect failed: {reason}")]
    ConnectFailed {
        /// What went wrong.
        reason: String,
    },
    /// Delivering a message failed.
    #[display("send failed: {reason}")]
    SendFailed {
        /// What went wrong.
        reason: String,
    },
}

/// A malformed or unrecognized inbound envelope.
///
/// The receive path logs these and drops the message; they never propagate
/// into the session state machine.
#[derive(Debug, Display, Error, From)]
#[display("failed to decode peer message: {source}")]
pub struct DecodeError {
    source: serde_json::Error,
}

/// Union of the failures the controller command surface can report.
#[derive(Debug, Display, Error, From)]
pub enum GameError {
    /// A declined move.
    #[display("{_0}")]
    Move(MoveError),
    /// A transport failure.
    #[display("{_0}")]
    Link(LinkError),
}
