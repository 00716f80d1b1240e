//! Caller channel
//!
//! `GET /ws/caller/:caller_id` (or `/ws/caller` for a generated id). Each
//! question is handled as an independent task; replies reach the socket
//! through the registry.

use axum::{
    extract::{ws::WebSocket, Path, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use helpdesk_core::{ConnectionRole, EscalationCoordinator};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::connection::Connection;
use super::protocol::CallerInbound;
use super::SocketContext;

/// Caller WebSocket with an explicit caller id
pub async fn caller_handler(
    ws: WebSocketUpgrade,
    Path(caller_id): Path<String>,
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Extension(ctx): Extension<SocketContext>,
) -> impl IntoResponse {
    upgrade(ws, caller_id, coordinator, ctx)
}

/// Caller WebSocket that gets an id assigned
pub async fn anonymous_caller_handler(
    ws: WebSocketUpgrade,
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Extension(ctx): Extension<SocketContext>,
) -> impl IntoResponse {
    upgrade(ws, generate_caller_id(), coordinator, ctx)
}

/// `caller-` followed by six hex digits
pub fn generate_caller_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("caller-{}", &hex[..6])
}

fn upgrade(
    ws: WebSocketUpgrade,
    caller_id: String,
    coordinator: Arc<EscalationCoordinator>,
    ctx: SocketContext,
) -> impl IntoResponse {
    ws.max_message_size(ctx.settings.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, caller_id, coordinator, ctx))
}

async fn handle_socket(
    socket: WebSocket,
    caller_id: String,
    coordinator: Arc<EscalationCoordinator>,
    ctx: SocketContext,
) {
    let mut conn = Connection::open(
        coordinator.registry().clone(),
        caller_id.clone(),
        ConnectionRole::Caller,
        ctx.settings.channel_capacity,
    );
    coordinator.welcome(&caller_id).await;

    conn.run(socket, &ctx, |text| match CallerInbound::parse(&text) {
        CallerInbound::Question(question) => {
            let coordinator = coordinator.clone();
            let caller_id = caller_id.clone();
            tokio::spawn(async move {
                coordinator.handle_caller_message(&caller_id, &question).await;
            });
        }
        CallerInbound::Empty => debug!(caller_id = %caller_id, "Ignoring empty message"),
    })
    .await;

    if conn.close() {
        coordinator.caller_disconnected(&caller_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_caller_id_format() {
        let id = generate_caller_id();
        assert!(id.starts_with("caller-"));
        assert_eq!(id.len(), "caller-".len() + 6);
        assert!(id["caller-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_caller_id());
    }
}
