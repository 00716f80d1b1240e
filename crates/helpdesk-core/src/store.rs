//! Request Store
//!
//! In-memory table of help requests. Records are never deleted and are lost
//! when the process exits.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::request::{HelpRequest, RequestStatus};

/// Outcome of [`RequestStore::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// This call moved the request from pending to answered
    Applied(HelpRequest),
    /// The request was already answered; the stored record is unchanged
    AlreadyAnswered(HelpRequest),
}

impl Resolution {
    /// Whether this call performed the transition
    #[must_use]
    pub fn is_first(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The stored record after the call
    #[must_use]
    pub fn request(&self) -> &HelpRequest {
        match self {
            Self::Applied(r) | Self::AlreadyAnswered(r) => r,
        }
    }

    /// Consume into the stored record
    #[must_use]
    pub fn into_request(self) -> HelpRequest {
        match self {
            Self::Applied(r) | Self::AlreadyAnswered(r) => r,
        }
    }
}

#[derive(Default)]
struct StoreInner {
    records: HashMap<String, HelpRequest>,
    order: Vec<String>,
}

/// Table of help requests keyed by id, remembering insertion order
#[derive(Default)]
pub struct RequestStore {
    inner: RwLock<StoreInner>,
}

impl RequestStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending request.
    ///
    /// A fresh id is generated when `id` is `None`. A caller-supplied id that
    /// already exists fails with [`Error::DuplicateId`].
    pub async fn create(
        &self,
        id: Option<String>,
        question: impl Into<String>,
        caller_id: impl Into<String>,
    ) -> Result<HelpRequest> {
        let mut inner = self.inner.write().await;

        let id = match id {
            Some(id) if inner.records.contains_key(&id) => return Err(Error::DuplicateId(id)),
            Some(id) => id,
            None => loop {
                let candidate = HelpRequest::generate_id();
                if !inner.records.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        let request = HelpRequest::new(id.clone(), question, caller_id);
        inner.records.insert(id.clone(), request.clone());
        inner.order.push(id);

        debug!(request_id = %request.id, caller_id = %request.caller_id, "Help request stored");
        Ok(request)
    }

    /// Apply a supervisor answer.
    ///
    /// The status check and the transition happen under one write lock, so of
    /// several concurrent calls for the same id exactly one gets
    /// [`Resolution::Applied`].
    pub async fn resolve(&self, id: &str, answer: impl Into<String>) -> Result<Resolution> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if record.apply_answer(answer) {
            debug!(request_id = %id, "Help request answered");
            Ok(Resolution::Applied(record.clone()))
        } else {
            Ok(Resolution::AlreadyAnswered(record.clone()))
        }
    }

    /// Get a request by id
    pub async fn get(&self, id: &str) -> Result<HelpRequest> {
        let inner = self.inner.read().await;
        inner
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Whether a request with this id exists
    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.records.contains_key(id)
    }

    /// Snapshot of all requests in insertion order
    pub async fn list(&self) -> Vec<HelpRequest> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    /// Total number of requests
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether the store holds no requests
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of requests still waiting for a supervisor
    pub async fn pending_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner
            .records
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .count()
    }
}
