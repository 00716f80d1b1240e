//! Server initialization
//!
//! Builds the shared components, the router, and runs the listener.

use anyhow::{Context, Result};
use axum::{Extension, Router};
use helpdesk_core::{ConnectionRegistry, EscalationCoordinator, RequestStore};
use helpdesk_knowledge::{KeywordMatcher, KnowledgeBase};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::AppConfig;
use super::loader::load_config;
use super::shutdown::shutdown_signal;
use crate::websocket::SocketContext;

/// Shared state behind the router
#[derive(Clone)]
pub struct Components {
    pub coordinator: Arc<EscalationCoordinator>,
    pub knowledge: Arc<KnowledgeBase>,
}

impl Components {
    /// Wire store, registry, knowledge base and matcher into a coordinator
    pub fn new(config: &AppConfig, knowledge: Arc<KnowledgeBase>) -> Self {
        let registry = Arc::new(ConnectionRegistry::with_send_timeout(
            config.websocket.send_timeout(),
        ));
        let matcher = Arc::new(KeywordMatcher::new(knowledge.clone()));
        let coordinator = EscalationCoordinator::new(Arc::new(RequestStore::new()), registry, matcher)
            .with_config(config.coordinator.to_core());

        Self {
            coordinator: Arc::new(coordinator),
            knowledge,
        }
    }
}

/// Load the configured knowledge base
pub async fn load_knowledge(config: &AppConfig) -> Result<Arc<KnowledgeBase>> {
    let kb = KnowledgeBase::load(&config.knowledge.path)
        .await
        .with_context(|| format!("Failed to load knowledge base from {}", config.knowledge.path))?;
    Ok(Arc::new(kb))
}

/// Build the main router with all endpoints
pub fn build_router(components: &Components, sockets: SocketContext) -> Router {
    Router::new()
        .merge(crate::api::health_routes())
        .merge(crate::api::api_router())
        .merge(crate::websocket::websocket_router())
        .layer(Extension(components.coordinator.clone()))
        .layer(Extension(components.knowledge.clone()))
        .layer(Extension(sockets))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the server
pub async fn run() -> Result<()> {
    let config = load_config()?;
    let knowledge = load_knowledge(&config).await?;
    let components = Components::new(&config, knowledge);

    let shutdown = CancellationToken::new();
    let sockets = SocketContext {
        settings: Arc::new(config.websocket.clone()),
        shutdown: shutdown.clone(),
    };
    let app = build_router(&components, sockets);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);
    info!(
        caller = %format!("ws://{addr}/ws/caller/<caller_id>"),
        supervisor = %format!("ws://{addr}/ws/supervisor"),
        relay = %format!("ws://{addr}/ws/relay"),
        "WebSocket channels ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("HTTP server error")?;

    info!("Helpdesk shutdown complete");
    Ok(())
}
