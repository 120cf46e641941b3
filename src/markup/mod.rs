//! Feedback markup extraction.
//!
//! [`extract`] is a pure function: raw model text in, [`AnnotationResult`]
//! out.  No I/O, no state, no error path.
//!
//! [`AnnotationResult`]: crate::conversation::AnnotationResult

pub mod extract;

pub use extract::extract;
