//! Help request records
//!
//! A help request is created when the matcher cannot answer a caller's
//! question and is answered at most once by a supervisor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller id used when a submission does not name its caller
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Lifecycle state of a help request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Waiting for a supervisor
    Pending,
    /// A supervisor answer has been applied
    Answered,
}

impl RequestStatus {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Answered => "answered",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A question escalated to a human supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpRequest {
    /// Opaque request identifier
    pub id: String,

    /// The caller's question
    pub question: String,

    /// Caller connection that asked the question
    pub caller_id: String,

    /// Current lifecycle state
    pub status: RequestStatus,

    /// Supervisor answer, present iff `status` is `Answered`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    /// When the request was created
    pub created_at: DateTime<Utc>,

    /// When the answer was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,
}

impl HelpRequest {
    /// Create a pending request
    #[must_use]
    pub fn new(id: impl Into<String>, question: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            caller_id: caller_id.into(),
            status: RequestStatus::Pending,
            answer: None,
            created_at: Utc::now(),
            answered_at: None,
        }
    }

    /// Generate a fresh request id
    #[must_use]
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Whether a supervisor answer has been applied
    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.status == RequestStatus::Answered
    }

    /// Apply a supervisor answer.
    ///
    /// Returns `false` and leaves the record untouched if it was already
    /// answered.
    pub fn apply_answer(&mut self, answer: impl Into<String>) -> bool {
        if self.is_answered() {
            return false;
        }
        self.status = RequestStatus::Answered;
        self.answer = Some(answer.into());
        self.answered_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let req = HelpRequest::new("r1", "what are your hours", "c1");
        assert_eq!(req.status, RequestStatus::Pending);
        assert!(req.answer.is_none());
        assert!(req.answered_at.is_none());
    }

    #[test]
    fn test_apply_answer_once() {
        let mut req = HelpRequest::new("r1", "q", "c1");
        assert!(req.apply_answer("first"));
        assert!(!req.apply_answer("second"));
        assert_eq!(req.answer.as_deref(), Some("first"));
        assert_eq!(req.status, RequestStatus::Answered);
        assert!(req.answered_at.is_some());
    }

    #[test]
    fn test_status_serialization() {
        let req = HelpRequest::new("r1", "q", "c1");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("answer").is_none());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(HelpRequest::generate_id(), HelpRequest::generate_id());
    }
}
