//! Error types for quiz-core.

use std::fmt;

use thiserror::Error;

use crate::types::QuestionId;

/// Result type alias using LoadError.
pub type Result<T> = std::result::Result<T, LoadError>;

/// Where a question record came from in its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 1-based line in a markdown source.
    Line(usize),
    /// 1-based record index in a JSON source.
    Record(usize),
}

impl Default for Location {
    fn default() -> Self {
        Self::Record(0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "line {line}"),
            Self::Record(index) => write!(f, "record {index}"),
        }
    }
}

/// Errors raised while loading and validating a question source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing question at {location}")]
    MissingQuestion { location: Location },

    #[error("missing answer at {location}")]
    MissingAnswer { location: Location },

    #[error("invalid ID at {location}: {value:?}")]
    InvalidId { location: Location, value: String },

    #[error("invalid question type at {location}: {value:?}")]
    InvalidKind { location: Location, value: String },

    #[error("duplicate ID {id} at {location}")]
    DuplicateId { id: QuestionId, location: Location },

    #[error("multiple-choice question {id} has no choices")]
    EmptyChoices { id: QuestionId },

    #[error("answer {answer:?} of question {id} is not one of its choices")]
    AnswerNotAChoice { id: QuestionId, answer: String },

    #[error("free-text question {id} lists choices")]
    UnexpectedChoices { id: QuestionId },

    #[error("question source is empty")]
    EmptySource,

    #[error("invalid JSON question source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read question source: {0}")]
    Io(#[from] std::io::Error),
}
