//! Error types for helpdesk-core
//!
//! Every error is local to the operation that produced it. None of them is
//! fatal to the coordinator; callers decide whether to report or drop.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// No help request with this id
    #[error("help request not found: {0}")]
    NotFound(String),

    /// A caller-supplied id collides with an existing help request
    #[error("help request already exists: {0}")]
    DuplicateId(String),

    /// The target connection is gone, closed, or did not accept the message in time
    #[error("connection not available: {0}")]
    NotConnected(String),

    /// An external collaborator (matcher, transport) failed or timed out
    #[error("adapter unavailable: {0}")]
    AdapterUnavailable(String),

    /// Malformed ingress input
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an adapter error
    #[must_use]
    pub fn adapter(msg: impl Into<String>) -> Self {
        Self::AdapterUnavailable(msg.into())
    }

    /// Create an invalid message error
    #[must_use]
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    /// Check if error is recoverable
    ///
    /// Recoverable errors are transient conditions of a peer; the same
    /// operation may succeed later without any change on the caller's side.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotConnected(_) | Self::AdapterUnavailable(_))
    }

    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::DuplicateId(_) => "duplicate_id",
            Self::NotConnected(_) => "not_connected",
            Self::AdapterUnavailable(_) => "adapter_unavailable",
            Self::InvalidMessage(_) => "invalid_message",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
