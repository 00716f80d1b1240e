//! Socket pump shared by every channel
//!
//! A connection owns the outbound queue registered in the
//! [`ConnectionRegistry`] and drains it into the socket. Inbound text frames
//! are handed to the channel's handler; pings, heartbeat and shutdown are
//! handled here.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use helpdesk_core::{ConnectionRegistry, ConnectionRole};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::SocketContext;

/// A registered socket connection
pub struct Connection {
    conn_id: String,
    role: ConnectionRole,
    handle_id: Uuid,
    registry: Arc<ConnectionRegistry>,
    outbound: mpsc::Receiver<String>,
}

impl Connection {
    /// Register a fresh outbound queue under `conn_id`
    pub fn open(
        registry: Arc<ConnectionRegistry>,
        conn_id: impl Into<String>,
        role: ConnectionRole,
        capacity: usize,
    ) -> Self {
        let conn_id = conn_id.into();
        let (tx, outbound) = mpsc::channel(capacity.max(1));
        let handle_id = registry.register(conn_id.clone(), role, tx);
        info!(conn_id = %conn_id, role = %role, "WebSocket connection opened");
        Self {
            conn_id,
            role,
            handle_id,
            registry,
            outbound,
        }
    }

    pub fn id(&self) -> &str {
        &self.conn_id
    }

    /// Pump frames until the peer leaves, goes silent, is superseded by a
    /// reconnect, or the server shuts down.
    pub async fn run<F>(&mut self, socket: WebSocket, ctx: &SocketContext, mut on_text: F)
    where
        F: FnMut(String) + Send,
    {
        let (mut ws_tx, mut ws_rx) = socket.split();

        let mut ping_interval = tokio::time::interval(ctx.settings.ping_interval());
        ping_interval.tick().await;
        let heartbeat_timeout = ctx.settings.heartbeat_timeout();
        let mut last_recv = Instant::now();

        loop {
            tokio::select! {
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            last_recv = Instant::now();
                            on_text(text);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            last_recv = Instant::now();
                            let _ = ws_tx.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            last_recv = Instant::now();
                        }
                        Some(Ok(Message::Binary(_))) => {
                            last_recv = Instant::now();
                            debug!(conn_id = %self.conn_id, "Ignoring binary frame");
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            warn!(conn_id = %self.conn_id, error = %e, "WebSocket error");
                            break;
                        }
                    }
                }
                frame = self.outbound.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        // Registration was replaced or dropped
                        None => {
                            debug!(conn_id = %self.conn_id, "Outbound queue closed");
                            break;
                        }
                    }
                }
                _ = ping_interval.tick() => {
                    if last_recv.elapsed() > heartbeat_timeout {
                        info!(conn_id = %self.conn_id, "Heartbeat timeout, closing");
                        break;
                    }
                    if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
                _ = ctx.shutdown.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    /// Release the registration. Returns `true` when no connection is left
    /// under this id, including one the registry already evicted after a
    /// failed delivery. Returns `false` when a newer connection took over.
    pub fn close(self) -> bool {
        let released = self.registry.release(&self.conn_id, self.handle_id);
        let vacated = released || !self.registry.is_connected(&self.conn_id);
        info!(
            conn_id = %self.conn_id,
            role = %self.role,
            superseded = !vacated,
            "WebSocket connection closed"
        );
        vacated
    }
}
