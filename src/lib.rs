//! Real-time language-learning feedback for tutor conversations.
//!
//! * [`conversation`] — utterance store and the feedback router.
//! * [`markup`] — extraction of tagged feedback blocks from model output.
//! * [`curriculum`] — scenario curriculum with an offline fallback.
//! * [`llm`] — text generation, prompts and the feedback orchestrator.
//! * [`pipeline`] — [`pipeline::ConversationSession`], tying it all together.
//! * [`config`] — TOML settings.

pub mod config;
pub mod conversation;
pub mod curriculum;
pub mod llm;
pub mod markup;
pub mod pipeline;
