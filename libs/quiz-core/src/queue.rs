//! Pending pool and retry queue of a quiz session.
//!
//! Membership is tracked by [`QuestionId`]. The pending pool always drains
//! before the retry queue is touched, so every question gets a first-pass
//! attempt before any retry.

use std::collections::VecDeque;

use crate::types::{Question, QuestionId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionQueue {
    pending: VecDeque<Question>,
    retry: VecDeque<Question>,
}

impl QuestionQueue {
    /// Queue `questions` for a first pass, keeping their order.
    pub fn new(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            pending: questions.into_iter().collect(),
            retry: VecDeque::new(),
        }
    }

    /// Apply the outcome of answering `current`.
    ///
    /// A correct answer retires the question from both queues. A miss removes
    /// it from the pending pool and appends it to the retry queue unless it
    /// is already waiting there.
    pub fn record_outcome(&mut self, current: &Question, is_correct: bool) {
        self.pending.retain(|q| q.id != current.id);

        if is_correct {
            self.retry.retain(|q| q.id != current.id);
        } else if !self.in_retry(&current.id) {
            self.retry.push_back(current.clone());
        }
    }

    /// Take the next question to present: pending head first, then the
    /// oldest miss. `None` means both queues are empty.
    pub fn select_next(&mut self) -> Option<Question> {
        self.pending
            .pop_front()
            .or_else(|| self.retry.pop_front())
    }

    pub fn pending(&self) -> &VecDeque<Question> {
        &self.pending
    }

    pub fn retry(&self) -> &VecDeque<Question> {
        &self.retry
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.pending.iter().any(|q| &q.id == id) || self.in_retry(id)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.retry.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.retry.len()
    }

    fn in_retry(&self, id: &QuestionId) -> bool {
        self.retry.iter().any(|q| &q.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn question(id: &str) -> Question {
        Question::free_text(id, format!("Q{id}"), format!("A{id}"))
    }

    fn ids(queue: &VecDeque<Question>) -> Vec<&str> {
        queue.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn pending_drains_before_retry() {
        let mut queue = QuestionQueue::new(vec![question("1"), question("2")]);
        let first = queue.select_next().unwrap();
        queue.record_outcome(&first, false);

        assert_eq!(queue.select_next().unwrap().id.as_str(), "2");
        assert_eq!(queue.select_next().unwrap().id.as_str(), "1");
        assert_eq!(queue.select_next(), None);
    }

    #[test]
    fn retry_is_fifo() {
        let mut queue = QuestionQueue::new(vec![question("1"), question("2"), question("3")]);
        for _ in 0..3 {
            let current = queue.select_next().unwrap();
            queue.record_outcome(&current, false);
        }
        assert_eq!(ids(queue.retry()), vec!["1", "2", "3"]);
        assert_eq!(queue.select_next().unwrap().id.as_str(), "1");
    }

    #[test]
    fn repeated_miss_is_not_duplicated() {
        let mut queue = QuestionQueue::new(vec![question("1"), question("2")]);
        let first = queue.select_next().unwrap();
        queue.record_outcome(&first, false);
        queue.record_outcome(&first, false);
        assert_eq!(ids(queue.retry()), vec!["1"]);
    }

    #[test]
    fn correct_answer_retires_question() {
        let mut queue = QuestionQueue::new(vec![question("1"), question("2")]);
        let q1 = question("1");
        queue.record_outcome(&q1, false);
        assert!(queue.contains(&q1.id));

        queue.record_outcome(&q1, true);
        assert!(!queue.contains(&q1.id));
        assert_eq!(ids(queue.pending()), vec!["2"]);
        assert!(queue.retry().is_empty());
    }

    #[test]
    fn membership_uses_id_not_text() {
        let a = Question::free_text("a", "Same?", "Yes");
        let b = Question::free_text("b", "Same?", "No");
        let mut queue = QuestionQueue::new(vec![a.clone(), b.clone()]);

        queue.record_outcome(&a, true);
        assert!(queue.contains(&b.id));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn empty_queue_signals_completion() {
        let mut queue = QuestionQueue::default();
        assert!(queue.is_empty());
        assert_eq!(queue.select_next(), None);
    }
}
