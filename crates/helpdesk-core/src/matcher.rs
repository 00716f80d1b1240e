//! Matcher Adapter
//!
//! Boundary to the automated answer matcher. The coordinator only knows
//! this trait; the keyword matcher over the knowledge base lives in the
//! `helpdesk-knowledge` crate.

use async_trait::async_trait;

use crate::error::Result;

/// Turns a caller question into an answer, or `None` when nothing matches.
///
/// Implementations must be deterministic for a given knowledge base and
/// free of side effects. Errors are treated as "no match" by the
/// coordinator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Matcher: Send + Sync {
    /// Find an answer for the question
    async fn find_answer(&self, question: &str) -> Result<Option<String>>;
}
