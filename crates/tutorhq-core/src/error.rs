//! Error types for the storage boundary, sessions and quiz runs.
//!
//! The rule functions themselves never fail: unknown ids and missing
//! thresholds degrade to "not passed". Only collaborator wiring can error.

use thiserror::Error;

/// Errors reported by a [`StudentStore`](crate::traits::StudentStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be encoded or decoded.
    #[error("failed to encode student record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local filesystem failure.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from [`StudentSession`](crate::session::StudentSession) mutations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No student identifier was established; nothing can be mutated.
    #[error("no student session established")]
    NoStudent,

    /// Loading the initial record failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from finishing a quiz run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    /// Some questions have no chosen option yet.
    #[error("{unanswered} question(s) still unanswered")]
    Unanswered { unanswered: usize },

    /// The test has no questions to ask.
    #[error("test '{0}' has no questions")]
    Empty(String),
}

impl SessionError {
    /// Returns `true` for wiring bugs the caller should surface rather than retry.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SessionError::NoStudent)
    }
}
