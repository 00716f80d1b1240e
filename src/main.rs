//! Helpdesk - Escalation Coordination and Message Relay
//!
//! CLI entry point for the helpdesk relay server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod cli;
mod server;
mod websocket;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "helpdesk=info,helpdesk_core=info,helpdesk_knowledge=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = cli::Cli::parse();
    if cli.command.is_some() {
        info!("Starting helpdesk relay v{}", env!("CARGO_PKG_VERSION"));
    }

    cli::run(cli).await
}
