use std::time::Duration;

use thiserror::Error;

use crate::models::StageKind;

/// Malformed caller input, rejected before any collaborator is called
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationInputError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("margin for {metric} must be non-negative (got {value})")]
    NegativeMargin { metric: &'static str, value: f64 },

    #[error("target for {metric} must be non-negative (got {value})")]
    NegativeTarget { metric: &'static str, value: f64 },

    #[error("band for {metric} has min above max")]
    InvertedBand { metric: &'static str },

    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("at least one generation setting is required")]
    NoGenerationSettings,

    #[error("candidates_per_setting must be at least 1")]
    ZeroCandidates,

    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,

    #[error("call_timeout_secs must be at least 1")]
    ZeroTimeout,
}

/// Failure of a single Analyzer, Generator or TieBreaker call
#[derive(Debug, Clone, Error)]
pub enum CollaboratorError {
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("task aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollaboratorError::Malformed(err.to_string())
        } else {
            CollaboratorError::Transport(err.to_string())
        }
    }
}

/// A stage that could not produce any usable output
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error("{stage} stage produced no usable candidates ({attempted} attempted)")]
    GenerationExhausted { stage: StageKind, attempted: usize },

    #[error("{stage} stage found no candidate within the target band")]
    NoPassingCandidate { stage: StageKind },
}
