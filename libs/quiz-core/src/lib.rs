//! Core quiz engine shared by the terminal client and the backend.
//!
//! Provides:
//! - Question sources (JSON and markdown) with load-time validation
//! - Answer matching (Jaccard similarity over token sets)
//! - The pending/retry question queue
//! - The session controller state machine

pub mod error;
pub mod matching;
pub mod parser;
pub mod queue;
pub mod session;
pub mod source;
pub mod types;

pub use error::{LoadError, Location, Result};
pub use matching::{grade, is_close_enough, similarity, MatchResult, DEFAULT_THRESHOLD};
pub use queue::QuestionQueue;
pub use session::{AdvanceTicket, Phase, QuizSession, SessionProgress, SubmitOutcome};
pub use source::{QuestionSource, SourceFormat};
pub use types::{
    GradingMode, Question, QuestionId, QuestionKind, RawQuestion, SessionOutcome,
    SessionSettings, DEFAULT_ADVANCE_DELAY,
};
