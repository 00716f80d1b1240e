//! Wire protocol for the caller and supervisor channels.
//!
//! Transport payloads are converted here, once, into typed messages.

use serde::{Deserialize, Serialize};

/// A frame received on a caller socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerInbound {
    /// A question to answer or escalate
    Question(String),
    /// Nothing to act on
    Empty,
}

#[derive(Deserialize)]
struct Envelope {
    message: String,
}

impl CallerInbound {
    /// Accepts raw text or a JSON object carrying a `message` field
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        let question = if trimmed.starts_with('{') {
            match serde_json::from_str::<Envelope>(trimmed) {
                Ok(envelope) => envelope.message.trim().to_string(),
                Err(_) => trimmed.to_string(),
            }
        } else {
            trimmed.to_string()
        };

        if question.is_empty() {
            Self::Empty
        } else {
            Self::Question(question)
        }
    }
}

/// Supervisor → server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupervisorMessage {
    /// Answer an escalated help request
    #[serde(alias = "resolve")]
    AnswerHelpRequest {
        #[serde(default)]
        request_id: String,
        #[serde(default)]
        answer: String,
    },
    /// Keep-alive
    Ping,
}

/// Server → supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupervisorReply {
    /// The answer was accepted
    AnswerConfirmed { request_id: String },
    /// The message could not be handled
    Error {
        request_id: Option<String>,
        code: String,
        message: String,
    },
    Pong,
}

impl SupervisorReply {
    pub fn error(request_id: Option<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            request_id,
            code: code.into(),
            message: message.into(),
        }
    }
}
