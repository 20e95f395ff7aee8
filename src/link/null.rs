//! An offline stand-in transport for single-device play.

use super::{LinkEvent, PeerInfo, PeerLink};
use crate::error::LinkError;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// A transport that goes nowhere.
///
/// Hosting and connecting succeed, scans find nothing, and sends are
/// swallowed. Lets the controller run a single-device session without
/// special-casing the absence of a peer.
#[derive(Debug, Default)]
pub struct NullLink {
    // Kept so an events() receiver stays open for the controller's pump.
    subscriber: Mutex<Option<mpsc::UnboundedSender<LinkEvent>>>,
}

impl NullLink {
    /// Creates a new offline stand-in.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PeerLink for NullLink {
    async fn start_hosting(&self, _advertised_name: &str) -> Result<(), LinkError> {
        Ok(())
    }

    async fn stop_hosting(&self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn scan(&self, _timeout: Duration) -> Result<Vec<PeerInfo>, LinkError> {
        Ok(Vec::new())
    }

    async fn connect(&self, _peer: &PeerInfo) -> Result<(), LinkError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        Ok(())
    }

    async fn send(&self, _payload: &[u8]) -> Result<(), LinkError> {
        Ok(())
    }

    fn events(&self) -> mpsc::UnboundedReceiver<LinkEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.subscriber.lock().unwrap() = Some(tx);
        rx
    }
}
