//! Core error types.
//!
//! Invalid session transitions are not errors (they are ignored), so this
//! enum only covers construction, content editing, and audio decoding.

use thiserror::Error;

/// Errors raised by the quiz core.
#[derive(Debug, Error)]
pub enum QuizError {
    /// A session was started with no questions.
    #[error("quiz has no questions")]
    EmptyQuiz,

    /// No question with the given ID exists.
    #[error("question not found: {0}")]
    QuestionNotFound(String),

    /// The last remaining question cannot be removed.
    #[error("cannot remove the last question")]
    LastQuestion,

    /// An option index outside the question's options.
    #[error("option index {index} out of range (question has {count} options)")]
    OptionOutOfRange { index: usize, count: usize },

    /// The synthesized audio payload is not valid base64.
    #[error("invalid audio encoding: {0}")]
    AudioEncoding(String),

    /// The synthesized audio payload does not hold whole 16-bit samples.
    #[error("audio payload has odd length {0}")]
    AudioTruncated(usize),
}
