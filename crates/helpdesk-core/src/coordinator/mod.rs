//! Escalation Coordinator
//!
//! Per-request state machine:
//!
//! ```text
//! Received ──match──▶ MatchedReplied
//!    │
//!    └──no match──▶ Escalated ──supervisor answer──▶ Resolved
//! ```
//!
//! The coordinator holds no request state of its own. Requests live in the
//! [`RequestStore`], connections in the [`ConnectionRegistry`], and the
//! request → caller correlation in [`CallerMappings`]. It is safe to call
//! concurrently for different requests and callers.

mod mappings;


pub use mappings::CallerMappings;

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::registry::ConnectionRegistry;
use crate::relay::RelayFanout;
use crate::request::{HelpRequest, ANONYMOUS_CALLER};
use crate::store::RequestStore;

/// Coordinator settings
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on a matcher call; a timeout counts as "no match"
    pub matcher_timeout: Duration,
    /// Accept resolution ids that are substrings (either way) of a tracked id
    pub lenient_id_matching: bool,
    /// Sent to a caller when it connects
    pub greeting: String,
    /// Sent to a caller whose question was escalated
    pub escalation_notice: String,
    /// Sent to a caller when escalation itself failed
    pub escalation_failure_notice: String,
    /// Prepended to supervisor answers so callers can tell them from bot answers
    pub supervisor_answer_prefix: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            matcher_timeout: Duration::from_millis(2_000),
            lenient_id_matching: true,
            greeting: "Welcome to our salon! How can I help you today?".to_string(),
            escalation_notice: "I'm not sure about that. I've sent your question to a supervisor who will help you shortly.".to_string(),
            escalation_failure_notice: "I'm not sure about that, and I'm having trouble connecting to our help system. Please try again later.".to_string(),
            supervisor_answer_prefix: "[Supervisor Answer]: ".to_string(),
        }
    }
}

/// What happened to a caller message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerOutcome {
    /// The matcher answered directly
    Answered {
        /// Answer sent to the caller
        answer: String,
    },
    /// A help request was created and relays notified
    Escalated {
        /// The new request
        request: HelpRequest,
    },
    /// Escalation failed; the caller got the failure notice
    Failed {
        /// Error description
        reason: String,
    },
}

/// Fate of the answer delivery for a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Sent to the waiting caller
    Delivered {
        /// Caller that received the answer
        caller_id: String,
    },
    /// The caller was mapped but its connection is gone
    CallerGone {
        /// Caller that could not be reached
        caller_id: String,
    },
    /// Nobody was waiting (subscription cancelled, stale id, or lost race)
    NoWaitingCaller,
    /// The request had already been answered; nothing was done
    AlreadyResolved,
}

/// Result of a supervisor resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionOutcome {
    /// Stored record after the resolution
    pub request: HelpRequest,
    /// What happened to the caller delivery
    pub delivery: Delivery,
    /// Number of relay connections that received the update
    pub relays_notified: usize,
}

/// A help request submitted through the HTTP endpoint
#[derive(Debug, Clone, Default)]
pub struct NewHelpRequest {
    /// Caller-supplied id; generated when absent
    pub request_id: Option<String>,
    /// Question text
    pub question: String,
    /// Caller to deliver the answer to
    pub caller_id: Option<String>,
}

/// Orchestrates matching, escalation and resolution.
pub struct EscalationCoordinator {
    store: Arc<RequestStore>,
    registry: Arc<ConnectionRegistry>,
    matcher: Arc<dyn Matcher>,
    relay: RelayFanout,
    mappings: CallerMappings,
    config: CoordinatorConfig,
}

impl EscalationCoordinator {
    /// Create a coordinator over shared store, registry and matcher
    #[must_use]
    pub fn new(
        store: Arc<RequestStore>,
        registry: Arc<ConnectionRegistry>,
        matcher: Arc<dyn Matcher>,
    ) -> Self {
        let relay = RelayFanout::new(registry.clone());
        Self {
            store,
            registry,
            matcher,
            relay,
            mappings: CallerMappings::new(),
            config: CoordinatorConfig::default(),
        }
    }

    /// Replace the default settings
    #[must_use]
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// The request store
    #[must_use]
    pub fn store(&self) -> &Arc<RequestStore> {
        &self.store
    }

    /// The connection registry
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The caller mapping table
    #[must_use]
    pub fn mappings(&self) -> &CallerMappings {
        &self.mappings
    }

    /// Current settings
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Greet a newly connected caller
    pub async fn welcome(&self, caller_id: &str) {
        self.reply(caller_id, &self.config.greeting).await;
    }

    /// Handle one question from a caller.
    ///
    /// The caller always receives exactly one reply: the matched answer, the
    /// escalation notice, or the escalation failure notice. Never waits for a
    /// supervisor.
    pub async fn handle_caller_message(&self, caller_id: &str, text: &str) -> CallerOutcome {
        let question = text.trim();

        if let Some(answer) = self.consult_matcher(question).await {
            info!(caller_id = %caller_id, "Question answered by matcher");
            self.reply(caller_id, &answer).await;
            return CallerOutcome::Answered { answer };
        }

        match self.escalate(caller_id, question).await {
            Ok(request) => {
                self.reply(caller_id, &self.config.escalation_notice).await;
                CallerOutcome::Escalated { request }
            }
            Err(e) => {
                error!(caller_id = %caller_id, error = %e, "Failed to escalate question");
                self.reply(caller_id, &self.config.escalation_failure_notice)
                    .await;
                CallerOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Create a help request submitted out of band (HTTP).
    ///
    /// When a caller id is given the caller is subscribed to the answer;
    /// otherwise the request is recorded for the anonymous caller.
    pub async fn submit_request(&self, submission: NewHelpRequest) -> Result<HelpRequest> {
        let question = submission.question.trim();
        if question.is_empty() {
            return Err(Error::invalid_message("question is required"));
        }

        let request_id = submission.request_id.filter(|id| !id.trim().is_empty());
        let caller_id = submission.caller_id.filter(|id| !id.trim().is_empty());

        let request = match caller_id {
            Some(caller_id) => {
                self.mappings
                    .track(self.store.create(request_id, question, caller_id))
                    .await?
            }
            None => {
                self.store
                    .create(request_id, question, ANONYMOUS_CALLER)
                    .await?
            }
        };

        let relays = self.relay.broadcast_new_request(&request).await;
        info!(
            request_id = %request.id,
            caller_id = %request.caller_id,
            relays,
            "Help request submitted"
        );
        Ok(request)
    }

    /// Apply a supervisor's answer and relay it to the waiting caller.
    ///
    /// Unknown ids fail with [`Error::NotFound`] and have no side effects.
    /// Only the first resolution of a request delivers and broadcasts;
    /// repeats succeed as no-ops.
    pub async fn handle_supervisor_resolution(
        &self,
        request_id: &str,
        answer: &str,
    ) -> Result<ResolutionOutcome> {
        let request_id = request_id.trim();
        if request_id.is_empty() {
            return Err(Error::invalid_message("request_id is required"));
        }
        if answer.trim().is_empty() {
            return Err(Error::invalid_message("answer is required"));
        }

        let canonical_id = self.canonical_id(request_id).await;
        let resolution = match self.store.resolve(&canonical_id, answer).await {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Resolution rejected");
                return Err(e);
            }
        };

        if !resolution.is_first() {
            debug!(request_id = %canonical_id, "Repeated resolution ignored");
            return Ok(ResolutionOutcome {
                request: resolution.into_request(),
                delivery: Delivery::AlreadyResolved,
                relays_notified: 0,
            });
        }

        let request = resolution.into_request();
        let delivery = match self.mappings.take(&request.id).await {
            Some(caller_id) => self.deliver_answer(&request, caller_id).await,
            None => {
                info!(request_id = %request.id, "No caller waiting for this answer");
                Delivery::NoWaitingCaller
            }
        };

        let relays_notified = self.relay.broadcast_resolved(&request).await;
        info!(
            request_id = %request.id,
            relays = relays_notified,
            delivery = ?delivery,
            "Help request resolved"
        );

        Ok(ResolutionOutcome {
            request,
            delivery,
            relays_notified,
        })
    }

    /// Cancel every subscription of a caller whose connection closed
    pub async fn caller_disconnected(&self, caller_id: &str) {
        let cancelled = self.mappings.cancel_caller(caller_id).await;
        if !cancelled.is_empty() {
            info!(
                caller_id = %caller_id,
                requests = ?cancelled,
                "Caller left with pending requests"
            );
        }
    }

    async fn consult_matcher(&self, question: &str) -> Option<String> {
        match tokio::time::timeout(self.config.matcher_timeout, self.matcher.find_answer(question))
            .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(error = %e, "Matcher failed, treating as no match");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.config.matcher_timeout.as_millis() as u64,
                    "Matcher timed out, treating as no match"
                );
                None
            }
        }
    }

    async fn escalate(&self, caller_id: &str, question: &str) -> Result<HelpRequest> {
        let registry = &self.registry;
        let request = self
            .mappings
            .track_if(self.store.create(None, question, caller_id), |caller| {
                registry.is_connected(caller)
            })
            .await?;

        let relays = self.relay.broadcast_new_request(&request).await;
        info!(
            request_id = %request.id,
            caller_id = %caller_id,
            relays,
            "Question escalated to supervisor"
        );
        Ok(request)
    }

    async fn deliver_answer(&self, request: &HelpRequest, caller_id: String) -> Delivery {
        let answer = request.answer.as_deref().unwrap_or_default();
        let frame = format!("{}{}", self.config.supervisor_answer_prefix, answer);

        match self.registry.send(&caller_id, frame).await {
            Ok(()) => {
                debug!(request_id = %request.id, caller_id = %caller_id, "Supervisor answer delivered");
                Delivery::Delivered { caller_id }
            }
            Err(e) => {
                warn!(
                    request_id = %request.id,
                    caller_id = %caller_id,
                    error = %e,
                    "Caller gone, dropping supervisor answer"
                );
                Delivery::CallerGone { caller_id }
            }
        }
    }

    async fn canonical_id(&self, requested: &str) -> String {
        if self.store.contains(requested).await || !self.config.lenient_id_matching {
            return requested.to_string();
        }

        match self.mappings.find_lenient(requested).await {
            Some(tracked) => {
                info!(requested = %requested, matched = %tracked, "Request id matched leniently");
                tracked
            }
            None => requested.to_string(),
        }
    }

    async fn reply(&self, caller_id: &str, text: &str) {
        if let Err(e) = self.registry.send(caller_id, text).await {
            warn!(caller_id = %caller_id, error = %e, "Could not reply to caller");
        }
    }
}
