//! Answer matching for quiz questions.
//!
//! Free-text answers are scored with the Jaccard index over lower-cased
//! whitespace-separated token sets. Multiple-choice answers must equal the
//! recorded answer exactly.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Question, QuestionKind};

/// Minimum similarity for a free-text answer to count as correct.
pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// Result of grading an answer against a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the answer is considered correct.
    pub is_correct: bool,
    /// Similarity score between 0.0 and 1.0.
    pub similarity: f64,
    /// Which predicate was applied.
    pub kind: QuestionKind,
}

/// Grade `input` against `question` using the predicate for its kind.
pub fn grade(question: &Question, input: &str, threshold: f64) -> MatchResult {
    match question.kind {
        QuestionKind::MultipleChoice => {
            let is_correct = input == question.answer;
            MatchResult {
                is_correct,
                similarity: if is_correct { 1.0 } else { 0.0 },
                kind: question.kind,
            }
        }
        QuestionKind::FreeText => {
            let similarity = similarity(input, &question.answer);
            MatchResult {
                is_correct: similarity >= threshold,
                similarity,
                kind: question.kind,
            }
        }
    }
}

/// Whether `input` is similar enough to `correct` to be accepted.
pub fn is_close_enough(input: &str, correct: &str, threshold: f64) -> bool {
    similarity(input, correct) >= threshold
}

/// Jaccard similarity (0.0 to 1.0) of the token sets of `a` and `b`.
///
/// Two blank inputs are identical and score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = tokens(a);
    let right = tokens(b);

    let union = left.union(&right).count();
    if union == 0 {
        return 1.0;
    }

    let intersection = left.intersection(&right).count();
    intersection as f64 / union as f64
}

fn tokens(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
