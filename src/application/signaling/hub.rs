//! Live connection hub
//!
//! Owns the outbound queue of every accepted socket. The coordinator
//! addresses connections only by [`ConnectionId`]; the socket tasks drain
//! the queues.

use super::message::ServerMessage;
use crate::domain::shared::value_objects::ConnectionId;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Sending half of a connection's outbound queue
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;
/// Receiving half of a connection's outbound queue
pub type OutboundReceiver = mpsc::UnboundedReceiver<ServerMessage>;

/// Create the outbound queue for a new connection
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::unbounded_channel()
}

pub struct ConnectionHub {
    connections: RwLock<HashMap<ConnectionId, OutboundSender>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, id: ConnectionId, sender: OutboundSender) {
        self.connections.write().await.insert(id, sender);
        debug!("Connection {} registered", id);
    }

    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        self.connections.write().await.remove(id).is_some()
    }

    /// Queue a message for one connection; false if it is gone
    pub async fn send(&self, id: &ConnectionId, message: ServerMessage) -> bool {
        let connections = self.connections.read().await;
        match connections.get(id) {
            Some(sender) => {
                if sender.send(message).is_err() {
                    warn!("Outbound queue for connection {} is closed", id);
                    return false;
                }
                true
            }
            None => {
                debug!("Dropping message for unknown connection {}", id);
                false
            }
        }
    }

    /// Queue a message for every connection
    pub async fn broadcast(&self, message: ServerMessage) -> usize {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|sender| sender.send(message.clone()).is_ok())
            .count()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Drop every queue, which ends the socket writer tasks
    pub async fn close_all(&self) {
        self.connections.write().await.clear();
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}
