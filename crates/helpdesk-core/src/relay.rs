//! Relay Fan-out
//!
//! Broadcasts help request lifecycle events to every relay connection
//! (agents and supervisor consoles) so their local views converge.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::registry::{ConnectionRegistry, ConnectionRole};
use crate::request::{HelpRequest, RequestStatus};

/// Lifecycle events sent on the relay channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A question was escalated
    NewHelpRequest {
        /// Request identifier
        request_id: String,
        /// The caller's question
        question: String,
        /// Caller waiting for the answer
        caller_id: String,
    },
    /// A help request changed state
    HelpRequestUpdate {
        /// Request identifier
        request_id: String,
        /// New status
        status: RequestStatus,
        /// Supervisor answer
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<String>,
    },
}

impl RelayEvent {
    /// Event announcing a newly created request
    #[must_use]
    pub fn new_request(request: &HelpRequest) -> Self {
        Self::NewHelpRequest {
            request_id: request.id.clone(),
            question: request.question.clone(),
            caller_id: request.caller_id.clone(),
        }
    }

    /// Event announcing the current state of a request
    #[must_use]
    pub fn update(request: &HelpRequest) -> Self {
        Self::HelpRequestUpdate {
            request_id: request.id.clone(),
            status: request.status,
            answer: request.answer.clone(),
        }
    }

    /// Request id carried by any event variant
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::NewHelpRequest { request_id, .. } | Self::HelpRequestUpdate { request_id, .. } => {
                request_id
            }
        }
    }
}

/// Thin broadcaster over the connection registry's relay role.
#[derive(Clone)]
pub struct RelayFanout {
    registry: Arc<ConnectionRegistry>,
}

impl RelayFanout {
    /// Create a fan-out over the given registry
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Announce a new help request. Returns the number of relays reached.
    pub async fn broadcast_new_request(&self, request: &HelpRequest) -> usize {
        self.publish(RelayEvent::new_request(request)).await
    }

    /// Announce a resolved help request. Returns the number of relays reached.
    pub async fn broadcast_resolved(&self, request: &HelpRequest) -> usize {
        self.publish(RelayEvent::update(request)).await
    }

    /// Encode and broadcast an event
    pub async fn publish(&self, event: RelayEvent) -> usize {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!(request_id = %event.request_id(), error = %e, "Failed to encode relay event");
                return 0;
            }
        };

        let delivered = self.registry.broadcast(ConnectionRole::Relay, json).await;
        debug!(request_id = %event.request_id(), delivered, "Relay event published");
        delivered
    }
}
