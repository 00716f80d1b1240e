//! Caller mappings
//!
//! Correlates escalated request ids to the caller waiting on each one. A
//! mapping is the caller's subscription to its request: it is removed when
//! the answer is delivered or when the caller disconnects.

use std::future::Future;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::request::HelpRequest;

#[derive(Debug, Clone)]
struct Subscription {
    request_id: String,
    caller_id: String,
}

/// Table of `request_id -> caller_id`, at most one entry per request id.
///
/// Entries keep their insertion order so lenient lookups are deterministic.
#[derive(Default)]
pub struct CallerMappings {
    inner: Mutex<Vec<Subscription>>,
}

impl CallerMappings {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `create` while holding the table lock and record a mapping for
    /// the request it produces.
    ///
    /// A resolution racing with this call blocks in [`Self::take`] until the
    /// mapping is in place, so it cannot observe the request without it.
    pub async fn track<F>(&self, create: F) -> Result<HelpRequest>
    where
        F: Future<Output = Result<HelpRequest>>,
    {
        self.track_if(create, |_| true).await
    }

    /// Like [`Self::track`], but the mapping is only recorded when
    /// `still_waiting` holds for the request's caller once it exists.
    ///
    /// [`Self::cancel_caller`] needs the same lock, so a disconnect that
    /// lands after the check still finds and removes the mapping.
    pub async fn track_if<F, P>(&self, create: F, still_waiting: P) -> Result<HelpRequest>
    where
        F: Future<Output = Result<HelpRequest>>,
        P: FnOnce(&str) -> bool,
    {
        let mut subs = self.inner.lock().await;
        let request = create.await?;
        subs.retain(|s| s.request_id != request.id);
        if !still_waiting(&request.caller_id) {
            return Ok(request);
        }
        subs.push(Subscription {
            request_id: request.id.clone(),
            caller_id: request.caller_id.clone(),
        });
        Ok(request)
    }

    /// Remove and return the caller mapped to exactly this request id
    pub async fn take(&self, request_id: &str) -> Option<String> {
        let mut subs = self.inner.lock().await;
        let pos = subs.iter().position(|s| s.request_id == request_id)?;
        Some(subs.remove(pos).caller_id)
    }

    /// Find the first tracked request id that equals, contains, or is
    /// contained by `candidate`.
    pub async fn find_lenient(&self, candidate: &str) -> Option<String> {
        if candidate.is_empty() {
            return None;
        }
        let subs = self.inner.lock().await;
        subs.iter()
            .find(|s| {
                s.request_id == candidate
                    || s.request_id.contains(candidate)
                    || candidate.contains(s.request_id.as_str())
            })
            .map(|s| s.request_id.clone())
    }

    /// Caller currently mapped to a request id
    pub async fn caller_for(&self, request_id: &str) -> Option<String> {
        let subs = self.inner.lock().await;
        subs.iter()
            .find(|s| s.request_id == request_id)
            .map(|s| s.caller_id.clone())
    }

    /// Drop every mapping held by a caller. Returns the affected request ids.
    pub async fn cancel_caller(&self, caller_id: &str) -> Vec<String> {
        let mut subs = self.inner.lock().await;
        let mut cancelled = Vec::new();
        subs.retain(|s| {
            if s.caller_id == caller_id {
                cancelled.push(s.request_id.clone());
                false
            } else {
                true
            }
        });
        cancelled
    }

    /// Number of tracked mappings
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether no mappings are tracked
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    async fn tracked(mappings: &CallerMappings, id: &str, caller: &str) {
        let request = HelpRequest::new(id, "q", caller);
        mappings.track(async move { Ok(request) }).await.unwrap();
    }

    #[tokio::test]
    async fn test_track_and_take() {
        let mappings = CallerMappings::new();
        tracked(&mappings, "r1", "c1").await;

        assert_eq!(mappings.caller_for("r1").await.as_deref(), Some("c1"));
        assert_eq!(mappings.take("r1").await.as_deref(), Some("c1"));
        assert!(mappings.take("r1").await.is_none());
        assert!(mappings.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_create_records_nothing() {
        let mappings = CallerMappings::new();
        let result = mappings
            .track(async { Err(Error::DuplicateId("r1".into())) })
            .await;

        assert!(result.is_err());
        assert!(mappings.is_empty().await);
    }

    #[tokio::test]
    async fn test_track_if_skips_caller_no_longer_waiting() {
        let mappings = CallerMappings::new();
        let request = HelpRequest::new("r1", "q", "c1");

        let created = mappings
            .track_if(async move { Ok(request) }, |caller| caller != "c1")
            .await
            .unwrap();

        assert_eq!(created.id, "r1");
        assert!(mappings.caller_for("r1").await.is_none());
        assert!(mappings.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_lenient_both_directions() {
        let mappings = CallerMappings::new();
        tracked(&mappings, "abc-123-def", "c1").await;

        assert_eq!(mappings.find_lenient("abc-123-def").await.as_deref(), Some("abc-123-def"));
        assert_eq!(mappings.find_lenient("123").await.as_deref(), Some("abc-123-def"));
        assert_eq!(
            mappings.find_lenient("db:abc-123-def:v2").await.as_deref(),
            Some("abc-123-def")
        );
        assert!(mappings.find_lenient("zzz").await.is_none());
        assert!(mappings.find_lenient("").await.is_none());
    }

    #[tokio::test]
    async fn test_find_lenient_prefers_oldest() {
        let mappings = CallerMappings::new();
        tracked(&mappings, "req-1", "c1").await;
        tracked(&mappings, "req-10", "c2").await;

        assert_eq!(mappings.find_lenient("req-1").await.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn test_cancel_caller() {
        let mappings = CallerMappings::new();
        tracked(&mappings, "r1", "c1").await;
        tracked(&mappings, "r2", "c2").await;
        tracked(&mappings, "r3", "c1").await;

        let mut cancelled = mappings.cancel_caller("c1").await;
        cancelled.sort();
        assert_eq!(cancelled, vec!["r1", "r3"]);
        assert_eq!(mappings.len().await, 1);
        assert_eq!(mappings.caller_for("r2").await.as_deref(), Some("c2"));
    }
}
