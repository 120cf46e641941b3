//! Conversation data model: utterances, annotations and feedback results.
//!
//! All types are plain data and implement `Serialize` / `Deserialize` so a
//! rendering layer can snapshot the whole conversation as JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// UtteranceId / Role
// ---------------------------------------------------------------------------

/// Opaque, monotonically increasing utterance identifier.
///
/// Ids are issued by [`ConversationStore`](crate::conversation::ConversationStore)
/// and are unique within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtteranceId(pub(crate) u64);

impl UtteranceId {
    /// Raw numeric value (mostly for logging).
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

// ---------------------------------------------------------------------------
// Annotation
// ---------------------------------------------------------------------------

/// Kind of a single piece of feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Correction,
    Alternative,
    Encouragement,
}

/// One typed correction, alternative phrasing or encouragement.
///
/// Encouragement annotations only carry a message in `explanation`;
/// `original` and `corrected` are empty for that kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub original: String,
    pub corrected: String,
    pub explanation: String,
}

impl Annotation {
    pub fn correction(
        original: impl Into<String>,
        corrected: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            kind: AnnotationKind::Correction,
            original: original.into(),
            corrected: corrected.into(),
            explanation: explanation.into(),
        }
    }

    pub fn alternative(
        original: impl Into<String>,
        alternative: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            kind: AnnotationKind::Alternative,
            original: original.into(),
            corrected: alternative.into(),
            explanation: explanation.into(),
        }
    }

    pub fn encouragement(message: impl Into<String>) -> Self {
        Self {
            kind: AnnotationKind::Encouragement,
            original: String::new(),
            corrected: String::new(),
            explanation: message.into(),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            AnnotationKind::Encouragement => write!(f, "{}", self.explanation),
            _ => write!(
                f,
                "{} → {} ({})",
                self.original, self.corrected, self.explanation
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// AnnotationResult
// ---------------------------------------------------------------------------

/// How an [`AnnotationResult`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// Parsed from a non-empty model response.
    Parsed,
    /// The model answered with an empty body; a placeholder was substituted.
    Empty,
    /// The request timed out or failed; a placeholder was substituted.
    Degraded,
}

/// Parsed output of one feedback request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// Corrections and alternatives in document order.
    pub annotations: Vec<Annotation>,
    /// Text of the first `[ENCOURAGEMENT]` block, trimmed.
    pub encouragement: Option<String>,
    /// Response text with every well-formed tag block removed.
    pub clean_text: String,
    pub status: ResultStatus,
}

impl AnnotationResult {
    /// A result that carries nothing but a placeholder encouragement.
    pub fn placeholder(status: ResultStatus, message: impl Into<String>) -> Self {
        Self {
            annotations: Vec::new(),
            encouragement: Some(message.into()),
            clean_text: String::new(),
            status,
        }
    }

    /// `true` when at least one annotation or an encouragement is present.
    pub fn has_feedback(&self) -> bool {
        !self.annotations.is_empty() || self.encouragement.is_some()
    }

    /// Annotations followed by the encouragement (if any) as an
    /// [`AnnotationKind::Encouragement`] entry, for renderers that want a
    /// single flat list.
    pub fn flattened(&self) -> Vec<Annotation> {
        let mut all = self.annotations.clone();
        if let Some(msg) = &self.encouragement {
            all.push(Annotation::encouragement(msg.clone()));
        }
        all
    }
}

// ---------------------------------------------------------------------------
// Utterance / FeedbackRecord
// ---------------------------------------------------------------------------

/// One conversational turn.
///
/// Everything but `annotations` is immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: UtteranceId,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub annotations: Option<AnnotationResult>,
}

impl Utterance {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_annotated(&self) -> bool {
        self.annotations.is_some()
    }
}

/// Why a feedback record is not attached to an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// No eligible user utterance was available when the result arrived.
    Unrouted,
    /// End-of-session summary.
    SessionSummary,
}

/// Free-standing feedback kept alongside the utterance sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub kind: RecordKind,
    pub result: AnnotationResult,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encouragement_annotation_has_empty_fields() {
        let a = Annotation::encouragement("Nice try!");
        assert_eq!(a.kind, AnnotationKind::Encouragement);
        assert!(a.original.is_empty());
        assert!(a.corrected.is_empty());
        assert_eq!(a.to_string(), "Nice try!");
    }

    #[test]
    fn correction_display_uses_arrow() {
        let a = Annotation::correction("Je suis mange", "Je mange", "auxiliary");
        assert_eq!(a.to_string(), "Je suis mange → Je mange (auxiliary)");
    }

    #[test]
    fn placeholder_has_feedback_but_no_annotations() {
        let r = AnnotationResult::placeholder(ResultStatus::Degraded, "keep going");
        assert!(r.has_feedback());
        assert!(r.annotations.is_empty());
        assert!(r.clean_text.is_empty());
    }

    #[test]
    fn flattened_appends_encouragement_last() {
        let r = AnnotationResult {
            annotations: vec![Annotation::alternative("a", "b", "c")],
            encouragement: Some("bravo".into()),
            clean_text: String::new(),
            status: ResultStatus::Parsed,
        };
        let flat = r.flattened();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[1].kind, AnnotationKind::Encouragement);
        assert_eq!(flat[1].explanation, "bravo");
    }

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
