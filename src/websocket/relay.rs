//! Relay channel
//!
//! `GET /ws/relay`. Outbound only: agents and dashboards receive
//! `new_help_request` and `help_request_update` events. Inbound frames are
//! ignored.

use axum::{
    extract::{ws::WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use helpdesk_core::{ConnectionRole, EscalationCoordinator};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::connection::Connection;
use super::SocketContext;

/// Relay WebSocket handler
pub async fn relay_handler(
    ws: WebSocketUpgrade,
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Extension(ctx): Extension<SocketContext>,
) -> impl IntoResponse {
    ws.max_message_size(ctx.settings.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, coordinator, ctx))
}

async fn handle_socket(socket: WebSocket, coordinator: Arc<EscalationCoordinator>, ctx: SocketContext) {
    let mut conn = Connection::open(
        coordinator.registry().clone(),
        format!("relay-{}", Uuid::new_v4().simple()),
        ConnectionRole::Relay,
        ctx.settings.channel_capacity,
    );
    let conn_id = conn.id().to_string();

    conn.run(socket, &ctx, |_| {
        debug!(conn_id = %conn_id, "Ignoring inbound frame on relay channel");
    })
    .await;

    conn.close();
}
