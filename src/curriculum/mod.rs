//! Curriculum context: scenario framing, learning objectives and typical
//! corrections used to steer feedback.
//!
//! * [`CurriculumContext`] — the context itself (wire-compatible with the
//!   curriculum service).
//! * [`CurriculumService`] / [`HttpCurriculumService`] — the remote backend.
//! * [`CurriculumProvider`] — probe → fetch → fallback; never fails.
//! * [`fallback_context`] — deterministic offline curriculum.

pub mod context;
pub mod provider;
pub mod service;

pub use context::{fallback_context, CorrectionExample, CurriculumContext, Objective};
pub use provider::CurriculumProvider;
pub use service::{CurriculumError, CurriculumService, HttpCurriculumService};
