//! Quiz session controller.
//!
//! A session walks through five phases:
//!
//! ```text
//! Loading -> Presenting -> FeedbackCorrect   -(auto advance)-> Presenting | Completed
//!                       -> FeedbackIncorrect -(proceed)------> Presenting | Completed
//! Completed -(restart)-> Loading -> Presenting
//! ```
//!
//! The controller never sleeps. A correct answer hands out an [`AdvanceTicket`]
//! and the caller redeems it once the delay has elapsed; tickets from an
//! earlier session epoch, or superseded by a later one, are ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::matching::{self, MatchResult};
use crate::queue::QuestionQueue;
use crate::source::QuestionSource;
use crate::types::{GradingMode, Question, QuestionId, SessionOutcome, SessionSettings};

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Presenting,
    FeedbackCorrect,
    FeedbackIncorrect,
    Completed,
}

/// Permission to leave `FeedbackCorrect` after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceTicket {
    epoch: u64,
    seq: u64,
    pub delay: Duration,
}

impl AdvanceTicket {
    /// Session epoch the ticket was issued in.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// What a submit did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Incremental grading accepted the answer.
    Correct {
        result: MatchResult,
        advance: AdvanceTicket,
    },
    /// Incremental grading rejected the answer; waits for [`QuizSession::proceed`].
    Incorrect { result: MatchResult, expected: String },
    /// Batch grading stored the answer and moved on.
    Recorded { phase: Phase },
}

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered_correctly: usize,
    pub remaining: usize,
    pub retry_len: usize,
    pub presented: usize,
    pub is_complete: bool,
}

/// Everything that changes while a session runs; replaced wholesale on restart.
#[derive(Debug, Clone, Default, PartialEq)]
struct SessionState {
    queue: QuestionQueue,
    current: Option<Question>,
    /// Question whose feedback is on screen.
    reviewed: Option<Question>,
    answer: String,
    answered_correctly: usize,
    total: usize,
    presented: usize,
    answers: BTreeMap<QuestionId, String>,
}

/// In-memory quiz session over a fixed question source.
pub struct QuizSession<R = StdRng> {
    source: Vec<Question>,
    settings: SessionSettings,
    rng: R,
    state: SessionState,
    phase: Phase,
    epoch: u64,
    advance_seq: u64,
    pending_advance: Option<AdvanceTicket>,
    outcome: Option<SessionOutcome>,
}

impl QuizSession<StdRng> {
    /// Create a session in `Loading`; call [`QuizSession::start`] to present.
    pub fn new(source: &QuestionSource, settings: SessionSettings) -> Self {
        Self::with_rng(source, settings, StdRng::from_os_rng())
    }
}

impl<R: Rng> QuizSession<R> {
    pub fn with_rng(source: &QuestionSource, settings: SessionSettings, rng: R) -> Self {
        Self {
            source: source.questions().to_vec(),
            settings,
            rng,
            state: SessionState::default(),
            phase: Phase::Loading,
            epoch: 0,
            advance_seq: 0,
            pending_advance: None,
            outcome: None,
        }
    }

    /// Shuffle the source and present the first question.
    ///
    /// Does nothing unless the session is `Loading`.
    pub fn start(&mut self) {
        if self.phase != Phase::Loading {
            return;
        }

        let mut order = self.source.clone();
        order.shuffle(&mut self.rng);

        self.state = SessionState {
            total: order.len(),
            queue: QuestionQueue::new(order),
            ..SessionState::default()
        };
        self.advance();
    }

    /// Discard all progress, reshuffle and present a fresh first question.
    ///
    /// Outstanding advance tickets become stale.
    pub fn restart(&mut self) {
        self.epoch += 1;
        self.pending_advance = None;
        self.outcome = None;
        self.phase = Phase::Loading;
        self.start();
    }

    /// Replace the answer buffer.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        self.state.answer = answer.into();
    }

    /// Set the answer buffer and submit it.
    pub fn submit_answer(&mut self, answer: impl Into<String>) -> Option<SubmitOutcome> {
        self.set_answer(answer);
        self.submit()
    }

    /// Submit the answer buffer for the current question.
    ///
    /// Returns `None` (no-op) when no question is being presented.
    pub fn submit(&mut self) -> Option<SubmitOutcome> {
        if self.phase != Phase::Presenting {
            return None;
        }
        let current = self.state.current.take()?;
        let answer = std::mem::take(&mut self.state.answer);
        self.state
            .answers
            .insert(current.id.clone(), answer.clone());

        match self.settings.grading {
            GradingMode::Batch => {
                self.state.queue.record_outcome(&current, true);
                self.advance();
                if self.phase == Phase::Completed {
                    self.grade_batch();
                }
                Some(SubmitOutcome::Recorded { phase: self.phase })
            }
            GradingMode::Incremental => {
                let result = matching::grade(&current, &answer, self.settings.threshold);
                self.state.queue.record_outcome(&current, result.is_correct);

                let outcome = if result.is_correct {
                    self.state.answered_correctly += 1;
                    self.phase = Phase::FeedbackCorrect;
                    self.advance_seq += 1;
                    let ticket = AdvanceTicket {
                        epoch: self.epoch,
                        seq: self.advance_seq,
                        delay: self.settings.advance_delay,
                    };
                    self.pending_advance = Some(ticket);
                    SubmitOutcome::Correct {
                        result,
                        advance: ticket,
                    }
                } else {
                    self.phase = Phase::FeedbackIncorrect;
                    SubmitOutcome::Incorrect {
                        result,
                        expected: current.answer.clone(),
                    }
                };
                self.state.reviewed = Some(current);
                Some(outcome)
            }
        }
    }

    /// Leave `FeedbackCorrect` once the ticket's delay has elapsed.
    ///
    /// Returns the new phase, or `None` when the ticket is stale.
    pub fn auto_advance(&mut self, ticket: AdvanceTicket) -> Option<Phase> {
        if self.phase != Phase::FeedbackCorrect || self.pending_advance != Some(ticket) {
            return None;
        }
        self.advance();
        Some(self.phase)
    }

    /// Leave `FeedbackIncorrect` on an explicit continue.
    pub fn proceed(&mut self) -> Option<Phase> {
        if self.phase != Phase::FeedbackIncorrect {
            return None;
        }
        self.advance();
        Some(self.phase)
    }

    fn advance(&mut self) {
        self.pending_advance = None;
        self.state.reviewed = None;
        self.state.answer.clear();

        match self.state.queue.select_next() {
            Some(next) => {
                self.state.current = Some(next);
                self.state.presented += 1;
                self.phase = Phase::Presenting;
            }
            None => {
                self.state.current = None;
                self.phase = Phase::Completed;
            }
        }
    }

    fn grade_batch(&mut self) {
        let threshold = self.settings.threshold;
        let score = self
            .source
            .iter()
            .filter(|q| {
                self.state
                    .answers
                    .get(&q.id)
                    .is_some_and(|answer| matching::grade(q, answer, threshold).is_correct)
            })
            .count();
        self.state.answered_correctly = score;

        self.outcome = Some(SessionOutcome {
            answers: self.state.answers.clone(),
            score: u32::try_from(score).unwrap_or(u32::MAX),
            total: u32::try_from(self.state.total).unwrap_or(u32::MAX),
            grading: GradingMode::Batch,
            completed_at: Utc::now(),
        });
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Identifier of the current run; bumped by every restart.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current(&self) -> Option<&Question> {
        self.state.current.as_ref()
    }

    /// Question whose feedback is currently shown.
    pub fn reviewed(&self) -> Option<&Question> {
        self.state.reviewed.as_ref()
    }

    pub fn answer(&self) -> &str {
        &self.state.answer
    }

    pub fn queue(&self) -> &QuestionQueue {
        &self.state.queue
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.state.answers
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Graded record of a completed batch session.
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn progress(&self) -> SessionProgress {
        let in_hand = usize::from(self.state.current.is_some());
        SessionProgress {
            total: self.state.total,
            answered_correctly: self.state.answered_correctly,
            remaining: self.state.queue.len() + in_hand,
            retry_len: self.state.queue.retry().len(),
            presented: self.state.presented,
            is_complete: self.is_complete(),
        }
    }
}

impl<R> fmt::Debug for QuizSession<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("epoch", &self.epoch)
            .field("source_len", &self.source.len())
            .field("current", &self.state.current.as_ref().map(|q| &q.id))
            .field("queued", &self.state.queue.len())
            .field("answered_correctly", &self.state.answered_correctly)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source(questions: Vec<Question>) -> QuestionSource {
        QuestionSource::new(questions).unwrap()
    }

    fn session_with(questions: Vec<Question>, grading: GradingMode) -> QuizSession {
        let settings = SessionSettings {
            grading,
            ..SessionSettings::default()
        };
        QuizSession::with_rng(&source(questions), settings, StdRng::seed_from_u64(7))
    }

    fn arithmetic_and_capital() -> Vec<Question> {
        vec![
            Question::free_text("sum", "2+2?", "4"),
            Question::free_text("fr", "Capital of France?", "Paris"),
        ]
    }

    fn correct_answer(session: &QuizSession) -> String {
        session.current().unwrap().answer.clone()
    }

    fn assert_current_not_queued(session: &QuizSession) {
        if let Some(current) = session.current() {
            assert!(!session.queue().contains(&current.id));
        }
    }

    #[test]
    fn start_presents_first_question() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        assert_eq!(session.phase(), Phase::Loading);
        assert!(session.current().is_none());

        session.start();
        assert_eq!(session.phase(), Phase::Presenting);
        assert!(session.current().is_some());
        assert_eq!(session.queue().pending().len(), 1);
        assert_eq!(session.progress().total, 2);
        assert_current_not_queued(&session);
    }

    #[test]
    fn two_question_scenario() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        session.start();

        // Answer whichever comes first correctly.
        let first_id = session.current().unwrap().id.clone();
        let answer = correct_answer(&session);
        let Some(SubmitOutcome::Correct { advance, .. }) = session.submit_answer(answer) else {
            panic!("expected correct feedback");
        };
        assert_eq!(session.phase(), Phase::FeedbackCorrect);
        assert_eq!(advance.delay, Duration::from_millis(1500));
        assert_eq!(session.reviewed().unwrap().id, first_id);

        assert_eq!(session.auto_advance(advance), Some(Phase::Presenting));
        let second = session.current().unwrap().clone();
        assert_ne!(second.id, first_id);

        let outcome = session.submit_answer("Lyon").unwrap();
        assert!(matches!(outcome, SubmitOutcome::Incorrect { .. }));
        assert_eq!(session.phase(), Phase::FeedbackIncorrect);
        assert_eq!(session.queue().retry().len(), 1);
        assert_eq!(session.queue().retry()[0].id, second.id);
        assert!(session.queue().pending().is_empty());

        assert_eq!(session.proceed(), Some(Phase::Presenting));
        assert_eq!(session.current().unwrap().id, second.id);
        assert!(session.queue().is_empty());
        assert_eq!(session.answer(), "");

        let answer = second.answer.clone();
        let Some(SubmitOutcome::Correct { advance, .. }) = session.submit_answer(answer) else {
            panic!("expected correct feedback");
        };
        assert_eq!(session.auto_advance(advance), Some(Phase::Completed));
        assert!(session.is_complete());
        assert_eq!(session.progress().answered_correctly, 2);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn multiple_choice_needs_exact_answer() {
        let questions = vec![Question::multiple_choice("mc", "Pick", "B", ["A", "B", "C"])];
        let mut session = session_with(questions, GradingMode::Incremental);
        session.start();

        assert!(matches!(
            session.submit_answer("A"),
            Some(SubmitOutcome::Incorrect { .. })
        ));
        session.proceed();
        assert!(matches!(
            session.submit_answer("B"),
            Some(SubmitOutcome::Correct { .. })
        ));
    }

    #[test]
    fn submit_without_current_is_ignored() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        assert_eq!(session.submit_answer("4"), None);

        session.start();
        session.submit_answer("wrong");
        assert_eq!(session.phase(), Phase::FeedbackIncorrect);
        // A second submit during feedback is stale.
        assert_eq!(session.submit_answer("4"), None);
        assert_eq!(session.queue().retry().len(), 1);
    }

    #[test]
    fn incorrect_feedback_waits_for_proceed() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        session.start();
        session.submit_answer("wrong");

        assert_eq!(session.phase(), Phase::FeedbackIncorrect);
        assert!(session.current().is_none());
        assert_eq!(session.proceed(), Some(Phase::Presenting));
        assert_eq!(session.proceed(), None);
    }

    #[test]
    fn stale_ticket_after_restart_is_ignored() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        session.start();
        let answer = correct_answer(&session);
        let Some(SubmitOutcome::Correct { advance, .. }) = session.submit_answer(answer) else {
            panic!("expected correct feedback");
        };

        session.restart();
        let fresh = session.current().unwrap().id.clone();
        assert_eq!(session.auto_advance(advance), None);
        assert_eq!(session.phase(), Phase::Presenting);
        assert_eq!(session.current().unwrap().id, fresh);
        assert_ne!(advance.epoch(), session.epoch());
    }

    #[test]
    fn ticket_is_single_use() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        session.start();
        let answer = correct_answer(&session);
        let Some(SubmitOutcome::Correct { advance, .. }) = session.submit_answer(answer) else {
            panic!("expected correct feedback");
        };
        assert!(session.auto_advance(advance).is_some());
        assert_eq!(session.auto_advance(advance), None);
    }

    #[test]
    fn restart_resets_progress() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Incremental);
        session.start();
        while !session.is_complete() {
            let answer = correct_answer(&session);
            if let Some(SubmitOutcome::Correct { advance, .. }) = session.submit_answer(answer) {
                session.auto_advance(advance);
            }
        }
        assert_eq!(session.progress().answered_correctly, 2);

        session.restart();
        let progress = session.progress();
        assert_eq!(session.phase(), Phase::Presenting);
        assert_eq!(progress.answered_correctly, 0);
        assert_eq!(progress.retry_len, 0);
        assert_eq!(progress.presented, 1);
        assert_eq!(progress.total, 2);
        assert!(session.current().is_some());
    }

    #[test]
    fn every_question_missed_once_completes_within_twice_n() {
        let questions: Vec<Question> = (1..=6)
            .map(|i| Question::free_text(i.to_string().as_str(), format!("Q{i}"), format!("answer{i}")))
            .collect();
        let total = questions.len();
        let mut session = session_with(questions, GradingMode::Incremental);
        session.start();

        let mut missed = std::collections::HashSet::new();
        while !session.is_complete() {
            assert_current_not_queued(&session);
            let current = session.current().unwrap().clone();
            if missed.insert(current.id.clone()) {
                session.submit_answer("nope");
                session.proceed();
            } else if let Some(SubmitOutcome::Correct { advance, .. }) =
                session.submit_answer(current.answer)
            {
                session.auto_advance(advance);
            }
            assert!(session.progress().presented <= 2 * total);
        }

        assert_eq!(session.progress().presented, 2 * total);
        assert_eq!(session.progress().answered_correctly, total);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let questions: Vec<Question> = (1..=20)
            .map(|i| Question::free_text(i.to_string().as_str(), format!("Q{i}"), "A"))
            .collect();
        let mut session = session_with(questions, GradingMode::Incremental);
        session.start();

        let mut seen: Vec<String> = session
            .queue()
            .pending()
            .iter()
            .map(|q| q.id.to_string())
            .collect();
        seen.push(session.current().unwrap().id.to_string());
        seen.sort_by_key(|id| id.parse::<u32>().unwrap());
        let expected: Vec<String> = (1..=20).map(|i: u32| i.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn batch_mode_grades_at_end() {
        let mut session = session_with(arithmetic_and_capital(), GradingMode::Batch);
        session.start();

        let first = session.current().unwrap().clone();
        let outcome = session.submit_answer(first.answer.clone()).unwrap();
        assert_eq!(outcome, SubmitOutcome::Recorded { phase: Phase::Presenting });
        assert!(session.outcome().is_none());

        let second = session.current().unwrap().clone();
        let outcome = session.submit_answer("Lyon").unwrap();
        assert_eq!(outcome, SubmitOutcome::Recorded { phase: Phase::Completed });

        let outcome = session.outcome().unwrap();
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total, 2);
        assert_eq!(outcome.grading, GradingMode::Batch);
        assert_eq!(outcome.answers[&first.id], first.answer);
        assert_eq!(outcome.answers[&second.id], "Lyon");
        assert!(session.queue().retry().is_empty());
    }

    #[test]
    fn batch_restart_clears_outcome() {
        let mut session = session_with(
            vec![Question::free_text("1", "2+2?", "4")],
            GradingMode::Batch,
        );
        session.start();
        session.submit_answer("4");
        assert!(session.outcome().is_some());

        session.restart();
        assert!(session.outcome().is_none());
        assert!(session.answers().is_empty());
    }
}
