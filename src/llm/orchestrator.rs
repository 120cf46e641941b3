//! Feedback orchestrator — prompt → generation → markup extraction.
//!
//! Each call walks a small state machine:
//!
//! ```text
//! BuildingPrompt ──▶ AwaitingResponse ──┬─▶ Parsed    → extract(body)
//!                                       ├─▶ TimedOut  → degraded placeholder
//!                                       └─▶ Errored   → degraded placeholder
//! ```
//!
//! A call never returns an error and never retries; retrying is the
//! caller's decision.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FeedbackConfig;
use crate::conversation::{AnnotationResult, ResultStatus, Utterance};
use crate::curriculum::CurriculumContext;
use crate::llm::generator::{ChatMessage, GenerationError, GenerationRequest, TextGenerator};
use crate::llm::prompt::PromptBuilder;
use crate::markup::extract;

/// Encouragement used when generation timed out or failed.
pub const DEGRADED_ENCOURAGEMENT: &str =
    "Keep up the great work! I'm having technical difficulties with feedback right now.";

/// Encouragement used when the model answered with an empty body.
pub fn empty_encouragement(target_language: &str) -> String {
    format!("Good job practicing {target_language}! Keep going with your conversation.")
}

// ---------------------------------------------------------------------------
// FeedbackPhase
// ---------------------------------------------------------------------------

/// Phases of one feedback request (used for logging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackPhase {
    BuildingPrompt,
    AwaitingResponse,
    Parsed,
    TimedOut,
    Errored,
}

impl fmt::Display for FeedbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedbackPhase::BuildingPrompt => "building-prompt",
            FeedbackPhase::AwaitingResponse => "awaiting-response",
            FeedbackPhase::Parsed => "parsed",
            FeedbackPhase::TimedOut => "timed-out",
            FeedbackPhase::Errored => "errored",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// FeedbackOrchestrator
// ---------------------------------------------------------------------------

/// Produces an [`AnnotationResult`] for a learner utterance.
///
/// Cheap to share: wrap in `Arc` and call from many tasks at once.
pub struct FeedbackOrchestrator {
    generator: Arc<dyn TextGenerator>,
    timeout: Duration,
    native_language: String,
    history_window: usize,
    persona_prompt: Option<String>,
}

impl FeedbackOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &FeedbackConfig) -> Self {
        Self {
            generator,
            timeout: Duration::from_secs(config.timeout_secs),
            native_language: config.native_language.clone(),
            history_window: config.history_window,
            persona_prompt: None,
        }
    }

    /// Use `persona` as the system prompt's opening instead of the generic
    /// tutor persona.
    pub fn with_persona(mut self, persona: Option<String>) -> Self {
        self.persona_prompt = persona;
        self
    }

    /// Override the overall request budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request tagged feedback for `utterance_text`.
    ///
    /// Only the last `history_window` entries of `recent_history` are used.
    pub async fn request_feedback(
        &self,
        utterance_text: &str,
        target_language: &str,
        curriculum: &CurriculumContext,
        recent_history: &[Utterance],
    ) -> AnnotationResult {
        log::debug!("feedback: {}", FeedbackPhase::BuildingPrompt);
        let builder = PromptBuilder::new(target_language, &self.native_language);

        let start = recent_history.len().saturating_sub(self.history_window);
        let history = &recent_history[start..];

        let request = GenerationRequest {
            system_prompt: builder.system_prompt(self.persona_prompt.as_deref(), Some(curriculum)),
            messages: vec![ChatMessage::user(builder.feedback_prompt(
                utterance_text,
                Some(curriculum),
                history,
            ))],
        };

        self.run(&request, target_language).await
    }

    /// Request an end-of-session review over `history`.
    pub async fn request_session_summary(
        &self,
        target_language: &str,
        curriculum: &CurriculumContext,
        history: &[Utterance],
    ) -> AnnotationResult {
        log::debug!("summary: {}", FeedbackPhase::BuildingPrompt);
        let builder = PromptBuilder::new(target_language, &self.native_language);

        let request = GenerationRequest {
            system_prompt: builder.system_prompt(self.persona_prompt.as_deref(), Some(curriculum)),
            messages: vec![ChatMessage::user(
                builder.summary_prompt(Some(curriculum), history),
            )],
        };

        self.run(&request, target_language).await
    }

    async fn run(&self, request: &GenerationRequest, target_language: &str) -> AnnotationResult {
        log::debug!("feedback: {}", FeedbackPhase::AwaitingResponse);

        let outcome = match tokio::time::timeout(self.timeout, self.generator.generate(request)).await
        {
            Ok(inner) => inner,
            Err(_) => Err(GenerationError::Timeout),
        };

        match outcome {
            Ok(body) if body.trim().is_empty() => {
                log::warn!("feedback: generation returned an empty body");
                AnnotationResult::placeholder(
                    ResultStatus::Empty,
                    empty_encouragement(target_language),
                )
            }
            Ok(body) => {
                let result = extract(&body);
                log::debug!(
                    "feedback: {} ({} annotations, encouragement: {})",
                    FeedbackPhase::Parsed,
                    result.annotations.len(),
                    result.encouragement.is_some()
                );
                result
            }
            Err(GenerationError::EmptyResponse) => {
                log::warn!("feedback: generation returned no content");
                AnnotationResult::placeholder(
                    ResultStatus::Empty,
                    empty_encouragement(target_language),
                )
            }
            Err(GenerationError::Timeout) => {
                log::warn!(
                    "feedback: {} after {:?}, using placeholder",
                    FeedbackPhase::TimedOut,
                    self.timeout
                );
                AnnotationResult::placeholder(ResultStatus::Degraded, DEGRADED_ENCOURAGEMENT)
            }
            Err(e) => {
                log::warn!("feedback: {} ({e}), using placeholder", FeedbackPhase::Errored);
                AnnotationResult::placeholder(ResultStatus::Degraded, DEGRADED_ENCOURAGEMENT)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
