//! Keyword matcher over the knowledge base

use async_trait::async_trait;
use helpdesk_core::Matcher;
use std::sync::Arc;

use crate::knowledge::KnowledgeBase;

/// [`Matcher`] answering from a shared [`KnowledgeBase`]
#[derive(Clone)]
pub struct KeywordMatcher {
    kb: Arc<KnowledgeBase>,
}

impl KeywordMatcher {
    /// Create a matcher over the given knowledge base
    #[must_use]
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self { kb }
    }

    /// The knowledge base this matcher reads
    #[must_use]
    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.kb
    }
}

#[async_trait]
impl Matcher for KeywordMatcher {
    async fn find_answer(&self, question: &str) -> helpdesk_core::Result<Option<String>> {
        Ok(self.kb.find_answer(question).await)
    }
}
