#![warn(missing_docs)]
#![forbid(unsafe_code)]
//! Peer-to-peer Connect Four: a board engine, a session controller, a
//! JSON wire codec, and a pluggable peer transport.
//!
//! One side hosts and plays Red, the other scans, joins, and plays Yellow.
//! Moves are applied locally first, then relayed with the mover's post-move
//! snapshot so both sides converge even if they briefly disagree.
//!
//! ```no_run
//! use peerfour::{GameController, MemoryLink};
//! use std::sync::Arc;
//!
//! # async fn play() -> Result<(), peerfour::GameError> {
//! let (host_link, guest_link) = MemoryLink::pair("Alice", "Bob");
//! let (host, _host_events) = GameController::new(Arc::new(host_link), "Alice");
//! let (guest, _guest_events) = GameController::new(Arc::new(guest_link), "Bob");
//!
//! host.host_game("Alice").await?;
//! let peers = guest.scan_for_games().await?;
//! guest.join_game(&peers[0]).await?;
//! host.drop_piece(3).await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod error;
mod game;
mod link;
mod notify;
mod protocol;
mod session;

pub use controller::GameController;
pub use error::{DecodeError, GameError, LinkError, MoveError};
pub use game::{Board, COLS, Cell, GameMove, GameState, Player, ROWS};
pub use link::{
    DEFAULT_SCAN_TIMEOUT, LinkEvent, MemoryLink, NullLink, PeerInfo, PeerLink,
};
pub use notify::{GameEvent, Notifier};
pub use protocol::{
    GAME_NAME_PREFIX, MESSAGE_CHARACTERISTIC_ID, PeerMessage, SERVICE_ID,
};
pub use session::{GameSession, MAX_PLAYERS, SessionId};
