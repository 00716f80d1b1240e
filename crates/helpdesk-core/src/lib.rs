//! Helpdesk Core - Escalation Coordination
//!
//! This crate provides the coordination logic of the helpdesk relay,
//! including:
//! - Store: Help request records and their pending → answered lifecycle
//! - Registry: Live caller and relay connections with bounded delivery
//! - Relay: Broadcast of lifecycle events to agents and supervisor consoles
//! - Matcher: Boundary to the automated answer matcher
//! - Coordinator: Matching, escalation and supervisor resolution

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod relay;
pub mod request;
pub mod store;

pub use coordinator::{
    CallerMappings, CallerOutcome, CoordinatorConfig, Delivery, EscalationCoordinator,
    NewHelpRequest, ResolutionOutcome,
};
pub use error::{Error, Result};
pub use matcher::Matcher;
pub use registry::{ConnectionRegistry, ConnectionRole, DEFAULT_SEND_TIMEOUT_MS};
pub use relay::{RelayEvent, RelayFanout};
pub use request::{HelpRequest, RequestStatus, ANONYMOUS_CALLER};
pub use store::{RequestStore, Resolution};
