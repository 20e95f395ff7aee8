//! An in-process transport pair for tests and the loopback demo.

use super::{LinkEvent, PeerInfo, PeerLink};
use crate::error::LinkError;
use crate::protocol::GAME_NAME_PREFIX;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// One end of a wired transport pair.
///
/// Hosting on one end makes it discoverable from the other; once connected,
/// sends are delivered to the remote event queue in issue order. Cloning an
/// end shares its state, which lets a test keep a handle to a link it has
/// handed to a controller.
#[derive(Debug, Clone)]
pub struct MemoryLink {
    local: Arc<Mutex<EndState>>,
    remote: Arc<Mutex<EndState>>,
}

#[derive(Debug)]
struct EndState {
    device_name: String,
    advertised: Option<String>,
    connected: bool,
    events: Option<mpsc::UnboundedSender<LinkEvent>>,
}

impl EndState {
    fn new(device_name: &str) -> Self {
        Self {
            device_name: device_name.to_string(),
            advertised: None,
            connected: false,
            events: None,
        }
    }

    fn push(&self, event: LinkEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                debug!("memory link subscriber went away");
            }
        }
    }
}

impl MemoryLink {
    /// Creates a wired pair of ends with the given device names.
    pub fn pair(left: &str, right: &str) -> (Self, Self) {
        let a = Arc::new(Mutex::new(EndState::new(left)));
        let b = Arc::new(Mutex::new(EndState::new(right)));
        (
            Self {
                local: a.clone(),
                remote: b.clone(),
            },
            Self {
                local: b,
                remote: a,
            },
        )
    }
}

// Lock discipline: never hold both end locks at once.
#[async_trait]
impl PeerLink for MemoryLink {
    async fn start_hosting(&self, advertised_name: &str) -> Result<(), LinkError> {
        let mut local = self.local.lock().unwrap();
        local.advertised = Some(advertised_name.to_string());
        local.push(LinkEvent::HostingChanged(true));
        Ok(())
    }

    async fn stop_hosting(&self) -> Result<(), LinkError> {
        let (was_connected, local_name) = {
            let mut local = self.local.lock().unwrap();
            local.advertised = None;
            let was_connected = local.connected;
            local.connected = false;
            local.push(LinkEvent::HostingChanged(false));
            (was_connected, local.device_name.clone())
        };
        if was_connected {
            let remote_name = {
                let mut remote = self.remote.lock().unwrap();
                remote.connected = false;
                remote.push(LinkEvent::PeerDisconnected(local_name));
                remote.device_name.clone()
            };
            let local = self.local.lock().unwrap();
            local.push(LinkEvent::PeerDisconnected(remote_name));
        }
        Ok(())
    }

    async fn scan(&self, _timeout: Duration) -> Result<Vec<PeerInfo>, LinkError> {
        // The wired pair answers immediately; there is nothing to wait out.
        let remote = self.remote.lock().unwrap();
        Ok(remote
            .advertised
            .iter()
            .filter(|name| name.starts_with(GAME_NAME_PREFIX))
            .map(|name| PeerInfo { name: name.clone() })
            .collect())
    }

    async fn connect(&self, peer: &PeerInfo) -> Result<(), LinkError> {
        let local_name = self.local.lock().unwrap().device_name.clone();
        let remote_name = {
            let mut remote = self.remote.lock().unwrap();
            if remote.advertised.as_deref() != Some(peer.name.as_str()) {
                return Err(LinkError::ConnectFailed {
                    reason: format!("no host advertising {}", peer.name),
                });
            }
            remote.connected = true;
            remote.push(LinkEvent::PeerConnected(local_name));
            remote.device_name.clone()
        };
        let mut local = self.local.lock().unwrap();
        local.connected = true;
        local.push(LinkEvent::PeerConnected(remote_name));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), LinkError> {
        let local_name = {
            let mut local = self.local.lock().unwrap();
            if !local.connected {
                return Ok(());
            }
            local.connected = false;
            local.device_name.clone()
        };
        let remote_name = {
            let mut remote = self.remote.lock().unwrap();
            remote.connected = false;
            remote.push(LinkEvent::PeerDisconnected(local_name));
            remote.device_name.clone()
        };
        let local = self.local.lock().unwrap();
        local.push(LinkEvent::PeerDisconnected(remote_name));
        Ok(())
    }

    async fn send(&self, payload: &[u8]) -> Result<(), LinkError> {
        if !self.local.lock().unwrap().connected {
            return Err(LinkError::SendFailed {
                reason: "not connected".to_string(),
            });
        }
        let remote = self.remote.lock().unwrap();
        remote.push(LinkEvent::Message(payload.to_vec()));
        Ok(())
    }

    fn events(&self) -> mpsc::UnboundedReceiver<LinkEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.local.lock().unwrap().events = Some(tx);
        rx
    }
}
