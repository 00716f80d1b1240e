//! WebSocket module for the helpdesk relay
//!
//! Provides real-time channels:
//! - /ws/caller/:caller_id - Caller questions and answers
//! - /ws/caller - Same, with a generated caller id
//! - /ws/supervisor - Supervisor answers and lifecycle events
//! - /ws/relay - Lifecycle events only

pub mod caller;
pub mod connection;
pub mod protocol;
pub mod relay;
pub mod supervisor;

pub use caller::{anonymous_caller_handler, caller_handler};
pub use relay::relay_handler;
pub use supervisor::supervisor_handler;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::server::config::WebSocketConfig;

/// Per-socket settings and the server-wide shutdown token
#[derive(Clone)]
pub struct SocketContext {
    pub settings: Arc<WebSocketConfig>,
    pub shutdown: CancellationToken,
}

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new()
        .route("/ws/caller", get(anonymous_caller_handler))
        .route("/ws/caller/:caller_id", get(caller_handler))
        .route("/ws/supervisor", get(supervisor_handler))
        .route("/ws/relay", get(relay_handler))
}
