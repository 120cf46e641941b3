//! Annotation router — decides which utterance a feedback result belongs to.
//!
//! Routing order:
//!
//! ```text
//! hint is an unannotated user utterance ──▶ attach there          (Hinted)
//! otherwise scan newest → oldest for the
//! first unannotated user utterance     ──▶ attach there          (Scanned)
//! nothing eligible                      ──▶ free-standing record  (FreeStanding)
//! ```
//!
//! An utterance that already carries annotations is never a target.  That
//! occupancy check is what keeps association correct when two feedback
//! requests resolve in reverse order; no locking beyond the store's own
//! mutex is involved.

use serde::{Deserialize, Serialize};

use super::model::{AnnotationResult, RecordKind, UtteranceId};
use super::store::ConversationStore;

/// Where a result ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "via")]
pub enum Attachment {
    /// Attached to the utterance named by the caller's hint.
    Hinted { id: UtteranceId },
    /// Attached to the newest unannotated user utterance.
    Scanned { id: UtteranceId },
    /// Stored as a free-standing record at this index.
    FreeStanding { index: usize },
}

impl Attachment {
    /// Target utterance, if the result was attached to one.
    pub fn utterance(&self) -> Option<UtteranceId> {
        match self {
            Attachment::Hinted { id } | Attachment::Scanned { id } => Some(*id),
            Attachment::FreeStanding { .. } => None,
        }
    }
}

/// Attach `result` to the conversation. Never drops the result.
pub fn attach(
    result: AnnotationResult,
    store: &mut ConversationStore,
    hint: Option<UtteranceId>,
) -> Attachment {
    if let Some(id) = hint {
        let eligible = store
            .get(id)
            .is_some_and(|u| u.is_user() && !u.is_annotated());

        if eligible && store.patch(id, result.clone()).is_ok() {
            log::debug!("router: attached to hinted utterance {id}");
            return Attachment::Hinted { id };
        }
        log::debug!("router: hint {id} not eligible, scanning");
    }

    let target = store
        .utterances()
        .iter()
        .rev()
        .find(|u| u.is_user() && !u.is_annotated())
        .map(|u| u.id);

    if let Some(id) = target {
        if store.patch(id, result.clone()).is_ok() {
            log::debug!("router: attached to utterance {id} by scan");
            return Attachment::Scanned { id };
        }
    }

    let index = store.push_record(RecordKind::Unrouted, result);
    log::info!("router: no eligible utterance, stored free-standing record #{index}");
    Attachment::FreeStanding { index }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
