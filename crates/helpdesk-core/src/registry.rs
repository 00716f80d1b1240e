//! Connection Registry
//!
//! Tracks live caller channels and relay (agent / supervisor console)
//! channels. Each connection is represented by a bounded outbound queue
//! drained by the socket task that owns the transport; the registry only
//! pushes text frames into it.

use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Default bound on a single delivery.
pub const DEFAULT_SEND_TIMEOUT_MS: u64 = 2_000;

/// What a connection is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    /// A caller waiting for answers
    Caller,
    /// An observer subscribed to lifecycle broadcasts
    Relay,
}

impl std::fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Caller => write!(f, "caller"),
            Self::Relay => write!(f, "relay"),
        }
    }
}

struct ConnectionHandle {
    handle_id: Uuid,
    role: ConnectionRole,
    tx: mpsc::Sender<String>,
}

/// Registry of live connections keyed by connection id.
pub struct ConnectionRegistry {
    connections: DashMap<String, ConnectionHandle>,
    send_timeout: Duration,
}

impl ConnectionRegistry {
    /// Create a registry with the default send timeout
    #[must_use]
    pub fn new() -> Self {
        Self::with_send_timeout(Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS))
    }

    /// Create a registry with a custom send timeout
    #[must_use]
    pub fn with_send_timeout(send_timeout: Duration) -> Self {
        Self {
            connections: DashMap::new(),
            send_timeout,
        }
    }

    /// Register (or replace, on reconnect) the handle for a connection id.
    ///
    /// Returns the id of this registration, to be passed to [`Self::release`]
    /// when the owning socket goes away.
    pub fn register(
        &self,
        connection_id: impl Into<String>,
        role: ConnectionRole,
        tx: mpsc::Sender<String>,
    ) -> Uuid {
        let connection_id = connection_id.into();
        let handle_id = Uuid::new_v4();
        let previous = self.connections.insert(
            connection_id.clone(),
            ConnectionHandle {
                handle_id,
                role,
                tx,
            },
        );

        if previous.is_some() {
            info!(conn_id = %connection_id, role = %role, "Connection replaced");
        } else {
            debug!(conn_id = %connection_id, role = %role, "Connection registered");
        }
        handle_id
    }

    /// Remove a connection. No-op if absent.
    pub fn unregister(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            debug!(conn_id = %connection_id, "Connection unregistered");
        }
    }

    /// Remove a connection only if it is still the given registration.
    ///
    /// A socket that was superseded by a reconnect under the same id must not
    /// evict its successor.
    pub fn release(&self, connection_id: &str, handle_id: Uuid) -> bool {
        let removed = self
            .connections
            .remove_if(connection_id, |_, h| h.handle_id == handle_id)
            .is_some();
        if removed {
            debug!(conn_id = %connection_id, "Connection released");
        }
        removed
    }

    /// Deliver a frame to exactly one connection.
    ///
    /// A missing connection, or one that fails to accept the frame within the
    /// send timeout, yields [`Error::NotConnected`]; a failing connection is
    /// dropped from the registry.
    pub async fn send(&self, connection_id: &str, message: impl Into<String>) -> Result<()> {
        let (handle_id, tx) = self
            .connections
            .get(connection_id)
            .map(|h| (h.handle_id, h.tx.clone()))
            .ok_or_else(|| Error::NotConnected(connection_id.to_string()))?;

        if deliver(&tx, message.into(), self.send_timeout).await {
            Ok(())
        } else {
            warn!(conn_id = %connection_id, "Delivery failed, dropping connection");
            self.release(connection_id, handle_id);
            Err(Error::NotConnected(connection_id.to_string()))
        }
    }

    /// Deliver a frame to every connection with the given role.
    ///
    /// Deliveries run concurrently. A failure on one connection removes that
    /// connection and does not affect the others. Returns the number of
    /// successful deliveries.
    pub async fn broadcast(&self, role: ConnectionRole, message: impl Into<String>) -> usize {
        let message = message.into();
        let targets: Vec<(String, Uuid, mpsc::Sender<String>)> = self
            .connections
            .iter()
            .filter(|entry| entry.role == role)
            .map(|entry| (entry.key().clone(), entry.handle_id, entry.tx.clone()))
            .collect();

        if targets.is_empty() {
            debug!(role = %role, "No connections to broadcast to");
            return 0;
        }

        let timeout = self.send_timeout;
        let results = join_all(targets.into_iter().map(|(conn_id, handle_id, tx)| {
            let message = message.clone();
            async move {
                let ok = deliver(&tx, message, timeout).await;
                (conn_id, handle_id, ok)
            }
        }))
        .await;

        let mut delivered = 0;
        for (conn_id, handle_id, ok) in results {
            if ok {
                delivered += 1;
            } else {
                warn!(conn_id = %conn_id, role = %role, "Broadcast delivery failed, dropping connection");
                self.release(&conn_id, handle_id);
            }
        }

        debug!(role = %role, delivered, "Broadcast complete");
        delivered
    }

    /// Whether a connection with this id is registered
    #[must_use]
    pub fn is_connected(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// Number of registered connections with the given role
    #[must_use]
    pub fn count(&self, role: ConnectionRole) -> usize {
        self.connections.iter().filter(|e| e.role == role).count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn deliver(tx: &mpsc::Sender<String>, message: String, timeout: Duration) -> bool {
    matches!(tokio::time::timeout(timeout, tx.send(message)).await, Ok(Ok(())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConnectionRegistry {
        ConnectionRegistry::with_send_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_send_to_registered_connection() {
        let registry = registry();
        let (tx, mut rx) = mpsc::channel(4);
        registry.register("c1", ConnectionRole::Caller, tx);

        registry.send("c1", "hello").await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_send_to_missing_connection() {
        let registry = registry();
        let err = registry.send("nobody", "hello").await.unwrap_err();
        assert!(matches!(err, Error::NotConnected(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_send_to_closed_connection_drops_it() {
        let registry = registry();
        let (tx, rx) = mpsc::channel(4);
        registry.register("c1", ConnectionRole::Caller, tx);
        drop(rx);

        assert!(registry.send("c1", "hello").await.is_err());
        assert!(!registry.is_connected("c1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_to_stalled_connection_times_out() {
        let registry = registry();
        let (tx, _rx) = mpsc::channel(1);
        registry.register("c1", ConnectionRole::Caller, tx);

        registry.send("c1", "fills the queue").await.unwrap();
        let err = registry.send("c1", "never accepted").await.unwrap_err();
        assert!(matches!(err, Error::NotConnected(_)));
        assert!(!registry.is_connected("c1"));
    }

    #[tokio::test]
    async fn test_register_replaces_on_reconnect() {
        let registry = registry();
        let (old_tx, mut old_rx) = mpsc::channel(4);
        let (new_tx, mut new_rx) = mpsc::channel(4);

        let old_handle = registry.register("c1", ConnectionRole::Caller, old_tx);
        let new_handle = registry.register("c1", ConnectionRole::Caller, new_tx);
        assert_ne!(old_handle, new_handle);

        registry.send("c1", "hi").await.unwrap();
        assert_eq!(new_rx.recv().await.as_deref(), Some("hi"));
        assert!(old_rx.try_recv().is_err());

        // The superseded socket closing must not evict the new one.
        assert!(!registry.release("c1", old_handle));
        assert!(registry.is_connected("c1"));
        assert!(registry.release("c1", new_handle));
        assert!(!registry.is_connected("c1"));
    }

    #[tokio::test]
    async fn test_unregister_missing_is_noop() {
        let registry = registry();
        registry.unregister("nobody");
        assert_eq!(registry.count(ConnectionRole::Caller), 0);
    }

    #[tokio::test]
    async fn test_broadcast_isolates_failures() {
        let registry = registry();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, rx2) = mpsc::channel(4);
        let (tx3, mut rx3) = mpsc::channel(4);
        registry.register("r1", ConnectionRole::Relay, tx1);
        registry.register("r2", ConnectionRole::Relay, tx2);
        registry.register("r3", ConnectionRole::Relay, tx3);
        drop(rx2);

        let delivered = registry.broadcast(ConnectionRole::Relay, "event").await;

        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.as_deref(), Some("event"));
        assert_eq!(rx3.recv().await.as_deref(), Some("event"));
        assert!(!registry.is_connected("r2"));
        assert_eq!(registry.count(ConnectionRole::Relay), 2);
    }

    #[tokio::test]
    async fn test_broadcast_only_reaches_role() {
        let registry = registry();
        let (relay_tx, mut relay_rx) = mpsc::channel(4);
        let (caller_tx, mut caller_rx) = mpsc::channel(4);
        registry.register("relay", ConnectionRole::Relay, relay_tx);
        registry.register("caller", ConnectionRole::Caller, caller_tx);

        assert_eq!(registry.broadcast(ConnectionRole::Relay, "event").await, 1);
        assert_eq!(relay_rx.recv().await.as_deref(), Some("event"));
        assert!(caller_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections() {
        let registry = registry();
        assert_eq!(registry.broadcast(ConnectionRole::Relay, "event").await, 0);
    }
}
