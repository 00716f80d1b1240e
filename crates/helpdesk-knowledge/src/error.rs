//! Error types for helpdesk-knowledge

use thiserror::Error;
use uuid::Uuid;

/// Knowledge base error type
#[derive(Debug, Error)]
pub enum Error {
    /// An entry with the same question (case-insensitive) exists
    #[error("a similar question already exists in the knowledge base")]
    DuplicateQuestion(String),

    /// No entry with this id
    #[error("knowledge entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Missing or empty field
    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// The knowledge file could not be read
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The knowledge file is not a JSON array of entries
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    /// Get error code for protocol messages
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateQuestion(_) => "duplicate_question",
            Self::EntryNotFound(_) => "entry_not_found",
            Self::InvalidEntry(_) => "invalid_entry",
            Self::Io(_) => "io_error",
            Self::Parse(_) => "parse_error",
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Error::DuplicateQuestion("q".into()).code(), "duplicate_question");
        assert_eq!(Error::EntryNotFound(Uuid::nil()).code(), "entry_not_found");
        assert_eq!(Error::InvalidEntry("answer".into()).code(), "invalid_entry");
    }

    #[test]
    fn test_duplicate_message() {
        let err = Error::DuplicateQuestion("What are your hours?".into());
        assert_eq!(
            err.to_string(),
            "a similar question already exists in the knowledge base"
        );
    }
}
