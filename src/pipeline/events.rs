//! Notifications emitted by a [`ConversationSession`](super::ConversationSession).

use serde::{Deserialize, Serialize};

use crate::conversation::{Attachment, ResultStatus, UtteranceId};

/// Something changed in the conversation store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FeedbackEvent {
    /// A feedback result was routed. `target` may differ from
    /// `requested_for` when the requested utterance was already annotated.
    Attached {
        requested_for: UtteranceId,
        target: Attachment,
        status: ResultStatus,
    },

    /// The end-of-session summary was stored as a free-standing record.
    SummaryReady { record_index: usize },
}

impl FeedbackEvent {
    /// `true` for the end-of-session summary notification.
    pub fn is_summary(&self) -> bool {
        matches!(self, FeedbackEvent::SummaryReady { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let json = serde_json::to_value(FeedbackEvent::SummaryReady { record_index: 2 }).unwrap();
        assert_eq!(json["event"], "summary_ready");
        assert_eq!(json["record_index"], 2);
    }

    #[test]
    fn is_summary_only_for_summary_events() {
        assert!(FeedbackEvent::SummaryReady { record_index: 0 }.is_summary());
        let attached = FeedbackEvent::Attached {
            requested_for: UtteranceId(0),
            target: Attachment::FreeStanding { index: 0 },
            status: ResultStatus::Empty,
        };
        assert!(!attached.is_summary());
    }
}
