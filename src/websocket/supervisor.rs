//! Supervisor channel
//!
//! `GET /ws/supervisor`. The console is registered as a relay connection so
//! it observes lifecycle events, and may answer help requests.

use axum::{
    extract::{ws::WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    Extension,
};
use helpdesk_core::{ConnectionRole, Delivery, EscalationCoordinator};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::Connection;
use super::protocol::{SupervisorMessage, SupervisorReply};
use super::SocketContext;

/// Supervisor WebSocket handler
pub async fn supervisor_handler(
    ws: WebSocketUpgrade,
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Extension(ctx): Extension<SocketContext>,
) -> impl IntoResponse {
    ws.max_message_size(ctx.settings.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, coordinator, ctx))
}

async fn handle_socket(socket: WebSocket, coordinator: Arc<EscalationCoordinator>, ctx: SocketContext) {
    let conn_id = format!("supervisor-{}", Uuid::new_v4().simple());
    let mut conn = Connection::open(
        coordinator.registry().clone(),
        conn_id.clone(),
        ConnectionRole::Relay,
        ctx.settings.channel_capacity,
    );

    conn.run(socket, &ctx, |text| {
        let coordinator = coordinator.clone();
        let conn_id = conn_id.clone();
        tokio::spawn(async move {
            let reply = respond(&coordinator, &text).await;
            let json = match serde_json::to_string(&reply) {
                Ok(json) => json,
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to encode supervisor reply");
                    return;
                }
            };
            if let Err(e) = coordinator.registry().send(&conn_id, json).await {
                debug!(conn_id = %conn_id, error = %e, "Supervisor left before reply");
            }
        });
    })
    .await;

    conn.close();
}

/// Handle one supervisor frame and produce the reply
pub async fn respond(coordinator: &EscalationCoordinator, text: &str) -> SupervisorReply {
    let message: SupervisorMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            return SupervisorReply::error(
                None,
                "invalid_message",
                format!("unrecognised message: {e}"),
            )
        }
    };

    match message {
        SupervisorMessage::Ping => SupervisorReply::Pong,
        SupervisorMessage::AnswerHelpRequest { request_id, answer } => {
            match coordinator
                .handle_supervisor_resolution(&request_id, &answer)
                .await
            {
                Ok(outcome) => {
                    if outcome.delivery == Delivery::AlreadyResolved {
                        info!(request_id = %outcome.request.id, "Supervisor answered a resolved request");
                    }
                    if outcome.request.id != request_id.trim() {
                        debug!(
                            requested = %request_id,
                            matched = %outcome.request.id,
                            "Confirming with the supplied id"
                        );
                    }
                    SupervisorReply::AnswerConfirmed { request_id }
                }
                Err(e) => SupervisorReply::error(Some(request_id), e.code(), e.to_string()),
            }
        }
    }
}
