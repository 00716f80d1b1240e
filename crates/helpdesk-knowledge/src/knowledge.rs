//! Knowledge Base
//!
//! In-memory question/answer entries, seeded from a JSON file at startup
//! and grown at runtime as supervisors' answers are learned.

use chrono::{DateTime, Utc};
use helpdesk_core::HelpRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Provenance of entries loaded from the seed file
pub const SEED_SOURCE: &str = "initial-import";

/// A single question and its answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Entry id
    pub id: Uuid,
    /// Question as it was entered
    pub question: String,
    /// Answer given to callers
    pub answer: String,
    /// Where the entry came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Help request the entry was learned from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_request_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    fn new(
        question: String,
        answer: String,
        source: Option<String>,
        help_request_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            question,
            answer,
            source,
            help_request_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Shape of the seed file records
#[derive(Debug, Deserialize)]
struct SeedEntry {
    question: String,
    answer: String,
}

/// Knowledge base guarded by a single lock.
///
/// Entries are kept in insertion order; matching walks them in that order.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the seed file at `path`.
    ///
    /// A missing file yields an empty knowledge base. A file that is not a
    /// JSON array of `{question, answer}` objects is an error.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Knowledge base file not found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let seed: Vec<SeedEntry> = serde_json::from_str(&raw)?;
        let kb = Self::from_seed(seed.into_iter().map(|e| (e.question, e.answer)));
        info!(path = %path.display(), entries = kb.len().await, "Knowledge base loaded");
        Ok(kb)
    }

    /// Build from `(question, answer)` pairs, skipping blanks and duplicates
    pub fn from_seed<I, Q, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: Into<String>,
        A: Into<String>,
    {
        let mut entries: Vec<KnowledgeEntry> = Vec::new();
        for (question, answer) in pairs {
            let question = question.into().trim().to_string();
            let answer = answer.into().trim().to_string();
            if question.is_empty() || answer.is_empty() {
                debug!("Skipping blank seed entry");
                continue;
            }
            if find_duplicate(&entries, &question, None).is_some() {
                debug!(question = %question, "Skipping duplicate seed entry");
                continue;
            }
            entries.push(KnowledgeEntry::new(
                question,
                answer,
                Some(SEED_SOURCE.to_string()),
                None,
            ));
        }

        Self {
            entries: RwLock::new(entries),
        }
    }

    /// All entries, most recently updated first
    pub async fn entries(&self) -> Vec<KnowledgeEntry> {
        let mut entries = self.entries.read().await.clone();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries
    }

    /// Look up one entry
    pub async fn get(&self, id: Uuid) -> Result<KnowledgeEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(Error::EntryNotFound(id))
    }

    /// Number of entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the knowledge base has no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Add an entry. Questions must be unique ignoring case.
    pub async fn add(
        &self,
        question: &str,
        answer: &str,
        source: Option<String>,
        help_request_id: Option<String>,
    ) -> Result<KnowledgeEntry> {
        let (question, answer) = validate(question, answer)?;

        let mut entries = self.entries.write().await;
        if find_duplicate(&entries, &question, None).is_some() {
            return Err(Error::DuplicateQuestion(question));
        }

        let entry = KnowledgeEntry::new(question, answer, source, help_request_id);
        entries.push(entry.clone());
        info!(entry_id = %entry.id, source = ?entry.source, "Knowledge entry added");
        Ok(entry)
    }

    /// Replace the question and answer of an entry
    pub async fn update(&self, id: Uuid, question: &str, answer: &str) -> Result<KnowledgeEntry> {
        let (question, answer) = validate(question, answer)?;

        let mut entries = self.entries.write().await;
        if find_duplicate(&entries, &question, Some(id)).is_some() {
            return Err(Error::DuplicateQuestion(question));
        }

        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(Error::EntryNotFound(id))?;
        entry.question = question;
        entry.answer = answer;
        entry.updated_at = Utc::now();

        info!(entry_id = %id, "Knowledge entry updated");
        Ok(entry.clone())
    }

    /// Turn an answered help request into an entry
    pub async fn learn_from(&self, request: &HelpRequest) -> Result<KnowledgeEntry> {
        let answer = match (&request.answer, request.is_answered()) {
            (Some(answer), true) => answer,
            _ => {
                return Err(Error::InvalidEntry(format!(
                    "help request {} has not been answered",
                    request.id
                )))
            }
        };

        self.add(
            &request.question,
            answer,
            Some(format!("learned-from-request-{}", request.id)),
            Some(request.id.clone()),
        )
        .await
    }

    /// Answer for a question, if any entry matches.
    ///
    /// An entry whose question appears verbatim (ignoring case) in the input
    /// wins. Failing that, the first entry sharing at least half of its
    /// question words with the input wins.
    pub async fn find_answer(&self, question: &str) -> Option<String> {
        let input = question.to_lowercase();
        let entries = self.entries.read().await;

        if let Some(entry) = entries.iter().find(|e| {
            let q = e.question.to_lowercase();
            !q.is_empty() && input.contains(&q)
        }) {
            return Some(entry.answer.clone());
        }

        let input_words: HashSet<&str> = input.split_whitespace().collect();
        entries
            .iter()
            .find(|e| {
                let q = e.question.to_lowercase();
                let question_words: HashSet<&str> = q.split_whitespace().collect();
                if question_words.is_empty() {
                    return false;
                }
                let overlap = question_words.intersection(&input_words).count();
                overlap * 2 >= question_words.len()
            })
            .map(|e| e.answer.clone())
    }
}

fn validate(question: &str, answer: &str) -> Result<(String, String)> {
    let question = question.trim();
    let answer = answer.trim();
    if question.is_empty() {
        return Err(Error::InvalidEntry("question is required".to_string()));
    }
    if answer.is_empty() {
        return Err(Error::InvalidEntry("answer is required".to_string()));
    }
    Ok((question.to_string(), answer.to_string()))
}

fn find_duplicate<'a>(
    entries: &'a [KnowledgeEntry],
    question: &str,
    except: Option<Uuid>,
) -> Option<&'a KnowledgeEntry> {
    let needle = question.to_lowercase();
    entries
        .iter()
        .filter(|e| Some(e.id) != except)
        .find(|e| e.question.to_lowercase() == needle)
}
