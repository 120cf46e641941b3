//! Conversation state and annotation routing.
//!
//! This module provides:
//! * [`Utterance`], [`Annotation`], [`AnnotationResult`] — the data model.
//! * [`ConversationStore`] / [`SharedConversation`] — ordered, patch-once store.
//! * [`attach`] — routes a feedback result to the right utterance.

pub mod model;
pub mod router;
pub mod store;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use model::{
    Annotation, AnnotationKind, AnnotationResult, FeedbackRecord, RecordKind, ResultStatus, Role,
    Utterance, UtteranceId,
};
pub use router::{attach, Attachment};
pub use store::{lock_store, new_shared_conversation, ConversationStore, PatchError, SharedConversation};
