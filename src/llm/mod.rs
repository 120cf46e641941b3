//! Feedback generation on top of a text-generation service.
//!
//! This module provides:
//! * [`TextGenerator`] — async trait implemented by all generation backends.
//! * [`ApiGenerator`] — OpenAI-compatible REST backend.
//! * [`PromptBuilder`] — tutor system prompt, feedback and summary prompts.
//! * [`FeedbackOrchestrator`] — prompt → generate (bounded) → extract, with
//!   placeholder results on failure.
//! * [`GenerationError`] — error variants for generation calls.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lingua_feedback::config::AppConfig;
//! use lingua_feedback::curriculum::fallback_context;
//! use lingua_feedback::llm::{ApiGenerator, FeedbackOrchestrator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let orchestrator = FeedbackOrchestrator::new(
//!         Arc::new(ApiGenerator::from_config(&config.llm)),
//!         &config.feedback,
//!     );
//!
//!     let curriculum = fallback_context("French", "Cafe");
//!     let result = orchestrator
//!         .request_feedback("Je suis mange", "French", &curriculum, &[])
//!         .await;
//!
//!     for annotation in &result.annotations {
//!         println!("{annotation}");
//!     }
//! }
//! ```

pub mod generator;
pub mod orchestrator;
pub mod prompt;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use generator::{ApiGenerator, ChatMessage, GenerationError, GenerationRequest, TextGenerator};
pub use orchestrator::{empty_encouragement, FeedbackOrchestrator, FeedbackPhase, DEGRADED_ENCOURAGEMENT};
pub use prompt::PromptBuilder;
