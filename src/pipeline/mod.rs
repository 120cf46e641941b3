//! Session wiring for live conversations.
//!
//! [`ConversationSession`] appends turns to the shared store synchronously and
//! runs feedback requests as background tokio tasks. Each finished request is
//! routed through [`attach`](crate::conversation::attach) and reported as a
//! [`FeedbackEvent`] when an event channel is configured.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use lingua_feedback::config::AppConfig;
//! use lingua_feedback::pipeline::{ConversationSession, FeedbackEvent};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::channel::<FeedbackEvent>(32);
//!     let session = ConversationSession::from_config(&AppConfig::default()).with_events(tx);
//!
//!     session.prepare().await;
//!     session.user_turn("Je suis mange");
//!     session.assistant_turn("Ah, vous avez déjà mangé ?");
//!
//!     session.finish().await;
//!     while let Ok(event) = rx.try_recv() {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod events;
pub mod session;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use events::FeedbackEvent;
pub use session::ConversationSession;
