//! Health check endpoint

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use helpdesk_core::{ConnectionRole, EscalationCoordinator};
use serde::Serialize;
use std::sync::Arc;

/// Health response with live counters
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub pending_requests: usize,
    pub relay_connections: usize,
    pub caller_connections: usize,
}

async fn health_check(
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
) -> Json<HealthResponse> {
    let registry = coordinator.registry();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        pending_requests: coordinator.store().pending_count().await,
        relay_connections: registry.count(ConnectionRole::Relay),
        caller_connections: registry.count(ConnectionRole::Caller),
    })
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
