//! The transport seam: discovery, connection, and message delivery.

mod memory;
mod null;

pub use memory::MemoryLink;
pub use null::NullLink;

use crate::error::LinkError;
use crate::protocol::GAME_NAME_PREFIX;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default scan window before discovery gives up.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(10);

/// A discovered peer advertising a joinable game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// The peer's advertised name, game prefix included.
    pub name: String,
}

impl PeerInfo {
    /// The host-chosen part of the advertised name.
    pub fn display_name(&self) -> &str {
        self.name.strip_prefix(GAME_NAME_PREFIX).unwrap_or(&self.name)
    }
}

/// Asynchronous transport events, delivered concurrently with user commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A peer connected; carries its display name.
    PeerConnected(String),
    /// A peer disconnected; carries its display name.
    PeerDisconnected(String),
    /// An inbound message payload.
    Message(Vec<u8>),
    /// Host availability changed: advertising started or stopped.
    HostingChanged(bool),
}

/// Capability set the session controller requires of a transport.
///
/// Implementations are chosen once at composition time; the controller never
/// branches on which one is active. The connection is single-channel,
/// bidirectional, and delivers sends in issue order. Failures surface on the
/// initiating call and are never retried internally.
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Starts advertising `advertised_name` for discovery.
    async fn start_hosting(&self, advertised_name: &str) -> Result<(), LinkError>;

    /// Stops advertising and drops any connected peer.
    async fn stop_hosting(&self) -> Result<(), LinkError>;

    /// Scans for advertised games until `timeout` expires. Only names
    /// carrying the game prefix are reported. Dropping the returned future
    /// cancels the scan early.
    async fn scan(&self, timeout: Duration) -> Result<Vec<PeerInfo>, LinkError>;

    /// Connects to a discovered peer.
    async fn connect(&self, peer: &PeerInfo) -> Result<(), LinkError>;

    /// Disconnects from the current peer.
    async fn disconnect(&self) -> Result<(), LinkError>;

    /// Sends one message to the connected peer.
    async fn send(&self, payload: &[u8]) -> Result<(), LinkError>;

    /// Returns the stream of transport events. Each call replaces any
    /// previous subscriber.
    fn events(&self) -> mpsc::UnboundedReceiver<LinkEvent>;
}
