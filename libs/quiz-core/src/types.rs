//! Core types for the quiz engine.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, Location, Result};
use crate::matching::DEFAULT_THRESHOLD;

/// Stable identifier of a question within its source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Id assigned to a record that did not carry one (1-based position).
    pub fn positional(position: usize) -> Self {
        Self(position.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// How a question expects to be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    FreeText,
    MultipleChoice,
}

impl Default for QuestionKind {
    fn default() -> Self {
        Self::FreeText
    }
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeText => "free-text",
            Self::MultipleChoice => "multiple-choice",
        }
    }
}

/// A validated question. Immutable once loaded from a question source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl Question {
    pub fn free_text(
        id: impl Into<QuestionId>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            kind: QuestionKind::FreeText,
            choices: Vec::new(),
        }
    }

    pub fn multiple_choice(
        id: impl Into<QuestionId>,
        question: impl Into<String>,
        answer: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            answer: answer.into(),
            kind: QuestionKind::MultipleChoice,
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_multiple_choice(&self) -> bool {
        self.kind == QuestionKind::MultipleChoice
    }
}

/// Question as read from a source, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawQuestion {
    pub id: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    pub kind: Option<QuestionKind>,
    pub choices: Vec<String>,
    pub location: Location,
}

impl RawQuestion {
    /// Validate into a [`Question`], using `position` when no id was given.
    pub fn build(self, position: usize) -> Result<Question> {
        let location = self.location;
        let question = self
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or(LoadError::MissingQuestion { location })?;
        let answer = self
            .answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(LoadError::MissingAnswer { location })?;

        let id = match self.id {
            Some(id) if id.trim().is_empty() => {
                return Err(LoadError::InvalidId { location, value: id })
            }
            Some(id) => QuestionId::new(id.trim()),
            None => QuestionId::positional(position),
        };

        let choices: Vec<String> = self
            .choices
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        let kind = self.kind.unwrap_or(if choices.is_empty() {
            QuestionKind::FreeText
        } else {
            QuestionKind::MultipleChoice
        });

        match kind {
            QuestionKind::MultipleChoice => {
                if choices.is_empty() {
                    return Err(LoadError::EmptyChoices { id });
                }
                if !choices.iter().any(|c| *c == answer) {
                    return Err(LoadError::AnswerNotAChoice { id, answer });
                }
            }
            QuestionKind::FreeText => {
                if !choices.is_empty() {
                    return Err(LoadError::UnexpectedChoices { id });
                }
            }
        }

        Ok(Question {
            id,
            question,
            answer,
            kind,
            choices,
        })
    }
}

/// Grading strategy for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingMode {
    /// Grade every answer on submit, re-queue misses until all are correct.
    Incremental,
    /// Collect one answer per question and grade them all at the end.
    Batch,
}

impl Default for GradingMode {
    fn default() -> Self {
        Self::Incremental
    }
}

impl GradingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Batch => "batch",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "incremental" => Some(Self::Incremental),
            "batch" => Some(Self::Batch),
            _ => None,
        }
    }
}

/// Delay before a correct answer advances on its own.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub grading: GradingMode,
    pub threshold: f64,
    pub advance_delay: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            grading: GradingMode::default(),
            threshold: DEFAULT_THRESHOLD,
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }
}

/// Final record of a graded session, handed to the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub answers: BTreeMap<QuestionId, String>,
    pub score: u32,
    pub total: u32,
    pub grading: GradingMode,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(question: &str, answer: &str) -> RawQuestion {
        RawQuestion {
            question: Some(question.to_string()),
            answer: Some(answer.to_string()),
            location: Location::Record(1),
            ..RawQuestion::default()
        }
    }

    #[test]
    fn build_assigns_positional_id() {
        let question = raw("2+2?", "4").build(7).unwrap();
        assert_eq!(question.id, QuestionId::new("7"));
        assert_eq!(question.kind, QuestionKind::FreeText);
    }

    #[test]
    fn build_infers_multiple_choice_from_choices() {
        let mut input = raw("Pick", "B");
        input.choices = vec!["A".into(), "B".into(), "C".into()];
        let question = input.build(1).unwrap();
        assert!(question.is_multiple_choice());
        assert_eq!(question.choices.len(), 3);
    }

    #[test]
    fn build_rejects_multiple_choice_without_choices() {
        let mut input = raw("Pick", "B");
        input.kind = Some(QuestionKind::MultipleChoice);
        let err = input.build(1).unwrap_err();
        assert!(matches!(err, LoadError::EmptyChoices { .. }));
    }

    #[test]
    fn build_rejects_answer_outside_choices() {
        let mut input = raw("Pick", "D");
        input.choices = vec!["A".into(), "B".into()];
        let err = input.build(1).unwrap_err();
        assert!(matches!(err, LoadError::AnswerNotAChoice { .. }));
    }

    #[test]
    fn build_rejects_choices_on_free_text() {
        let mut input = raw("Pick", "A");
        input.kind = Some(QuestionKind::FreeText);
        input.choices = vec!["A".into()];
        let err = input.build(1).unwrap_err();
        assert!(matches!(err, LoadError::UnexpectedChoices { .. }));
    }

    #[test]
    fn build_rejects_blank_answer() {
        let err = raw("2+2?", "   ").build(1).unwrap_err();
        assert!(matches!(err, LoadError::MissingAnswer { .. }));
    }

    #[test]
    fn grading_mode_round_trips_names() {
        for mode in [GradingMode::Incremental, GradingMode::Batch] {
            assert_eq!(GradingMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(GradingMode::from_str("eventually"), None);
    }
}
