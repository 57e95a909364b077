//! kidquiz-core: Quiz session, narration fallback, and assessment.
//!
//! This crate defines the quiz data model, the per-question state machine,
//! the speech synthesizer with its cache and local fallback, and the
//! post-quiz assessment generator. Remote services and device audio are
//! reached only through the traits in [`traits`].

pub mod assessment;
pub mod audio;
pub mod editor;
pub mod error;
pub mod model;
pub mod parser;
pub mod phrases;
pub mod report;
pub mod session;
pub mod speech;
pub mod traits;
