//! Helpdesk Knowledge - Knowledge Base and Keyword Matcher
//!
//! This crate provides:
//! - Knowledge: Question/answer entries, seeded from JSON and learned from
//!   answered help requests
//! - Matcher: Keyword matcher implementing `helpdesk_core::Matcher`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod knowledge;
pub mod matcher;

pub use error::{Error, Result};
pub use knowledge::{KnowledgeBase, KnowledgeEntry, SEED_SOURCE};
pub use matcher::KeywordMatcher;
