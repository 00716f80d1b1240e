//! Server module for the helpdesk relay
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `loader`: Configuration loading from files and environment
//! - `shutdown`: Signal handling
//! - `init`: Component wiring, router, and run loop

pub mod config;
mod init;
mod loader;
mod shutdown;

pub use init::{load_knowledge, run};
#[cfg(test)]
pub use init::{build_router, Components};
pub use loader::load_config;
