//! Conversation state store — the single shared mutable resource.
//!
//! [`ConversationStore`] is an ordered, append-only sequence of
//! [`Utterance`]s plus a list of free-standing [`FeedbackRecord`]s.  The only
//! in-place mutation is [`patch`](ConversationStore::patch), which sets an
//! utterance's `annotations` exactly once.
//!
//! [`SharedConversation`] is a type alias for `Arc<Mutex<ConversationStore>>`
//! — cheap to clone and safe to share across tokio tasks.  Lock for a short
//! critical section; never hold the guard across `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{AnnotationResult, FeedbackRecord, RecordKind, Role, Utterance, UtteranceId};

// ---------------------------------------------------------------------------
// PatchError
// ---------------------------------------------------------------------------

/// Reasons a [`ConversationStore::patch`] is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("no utterance with id {0}")]
    UnknownId(UtteranceId),

    #[error("utterance {0} already carries annotations")]
    AlreadyAnnotated(UtteranceId),
}

// ---------------------------------------------------------------------------
// ConversationStore
// ---------------------------------------------------------------------------

/// Ordered conversation plus unrouted feedback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationStore {
    utterances: Vec<Utterance>,
    records: Vec<FeedbackRecord>,
    next_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Append a new utterance and return its freshly issued id.
    ///
    /// Appends are strictly ordered by call order.
    pub fn append(&mut self, role: Role, text: impl Into<String>) -> UtteranceId {
        self.next_id += 1;
        let id = UtteranceId(self.next_id);
        self.utterances.push(Utterance {
            id,
            role,
            text: text.into(),
            created_at: Utc::now(),
            annotations: None,
        });
        id
    }

    /// Set the annotations of utterance `id`.
    ///
    /// Refuses to overwrite annotations that are already present.
    pub fn patch(&mut self, id: UtteranceId, result: AnnotationResult) -> Result<(), PatchError> {
        let utterance = self
            .utterances
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(PatchError::UnknownId(id))?;

        if utterance.annotations.is_some() {
            return Err(PatchError::AlreadyAnnotated(id));
        }

        utterance.annotations = Some(result);
        Ok(())
    }

    /// Store `result` as a free-standing record and return its index.
    pub fn push_record(&mut self, kind: RecordKind, result: AnnotationResult) -> usize {
        self.records.push(FeedbackRecord {
            kind,
            result,
            created_at: Utc::now(),
        });
        self.records.len() - 1
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All utterances, oldest first.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// All free-standing feedback records, oldest first.
    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn get(&self, id: UtteranceId) -> Option<&Utterance> {
        self.utterances.iter().find(|u| u.id == id)
    }

    /// Most recent user utterance, annotated or not.
    pub fn latest_user(&self) -> Option<&Utterance> {
        self.utterances.iter().rev().find(|u| u.is_user())
    }

    /// The last `n` utterances, oldest first.
    pub fn recent(&self, n: usize) -> &[Utterance] {
        let start = self.utterances.len().saturating_sub(n);
        &self.utterances[start..]
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SharedConversation
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`ConversationStore`].
pub type SharedConversation = Arc<Mutex<ConversationStore>>;

/// Construct a new, empty [`SharedConversation`].
pub fn new_shared_conversation() -> SharedConversation {
    Arc::new(Mutex::new(ConversationStore::new()))
}

/// Lock the store, recovering the guard if a previous holder panicked.
///
/// Every mutation is a single push or a single field write, so the data
/// behind a poisoned lock is still consistent.
pub fn lock_store(shared: &SharedConversation) -> MutexGuard<'_, ConversationStore> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
