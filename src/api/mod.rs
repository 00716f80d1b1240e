//! Web API module for the helpdesk relay
//!
//! Provides REST API endpoints for:
//! - Help request submission, listing and resolution
//! - Knowledge base management and learning
//! - Health

pub mod error;
pub mod health;
pub mod help_requests;
pub mod knowledge;

#[cfg(test)]
mod tests;

use axum::Router;

pub use health::health_routes;
pub use help_requests::help_request_routes;
pub use knowledge::knowledge_routes;

/// Create the API router with all endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(help_request_routes())
        .merge(knowledge_routes())
}
