//! Line-oriented quiz front-end.
//!
//! Reads answers and commands from an async line source, feeds them to a
//! [`QuizSession`] and renders prompts and feedback to a writer. Auto-advance
//! tickets arrive over a channel from the [`AdvanceTimer`].

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use quiz_core::{AdvanceTicket, Phase, Question, QuestionKind, QuizSession, SubmitOutcome};

use crate::identity::Identity;
use crate::results::ResultSink;
use crate::timer::AdvanceTimer;

/// How long shutdown waits for in-flight result submissions.
const SUBMIT_GRACE: Duration = Duration::from_secs(5);

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Restart,
    Continue,
    Answer(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            ":quit" | ":q" => Self::Quit,
            ":restart" | ":r" => Self::Restart,
            ":continue" | ":c" => Self::Continue,
            _ => Self::Answer(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}

/// Whether the shell keeps reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Map a reply to a multiple-choice question onto its choice text.
///
/// Surrounding whitespace is dropped, since choices are stored trimmed.
/// Input that names a choice is kept; a number `n` picks the n-th choice.
fn resolve_choice(question: &Question, input: &str) -> String {
    if !question.is_multiple_choice() {
        return input.to_string();
    }
    let input = input.trim();
    if question.choices.iter().any(|c| c == input) {
        return input.to_string();
    }
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| question.choices.get(i))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

pub struct Shell<W: Write> {
    session: QuizSession,
    identity: Identity,
    sink: ResultSink,
    out: W,
    timer: AdvanceTimer,
    advance_tx: UnboundedSender<AdvanceTicket>,
    advance_rx: Option<UnboundedReceiver<AdvanceTicket>>,
    submitted_epoch: Option<u64>,
    submissions: Vec<JoinHandle<()>>,
}

impl<W: Write> Shell<W> {
    pub fn new(session: QuizSession, identity: Identity, sink: ResultSink, out: W) -> Self {
        let (advance_tx, advance_rx) = mpsc::unbounded_channel();
        Self {
            session,
            identity,
            sink,
            out,
            timer: AdvanceTimer::new(),
            advance_tx,
            advance_rx: Some(advance_rx),
            submitted_epoch: None,
            submissions: Vec::new(),
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Start the session and process input until `:quit` or end of input.
    pub async fn run<I>(&mut self, input: I) -> Result<()>
    where
        I: AsyncBufRead + Unpin,
    {
        let mut advance_rx = self
            .advance_rx
            .take()
            .ok_or_else(|| anyhow!("shell is already running"))?;
        let mut lines = input.lines();

        self.start()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if self.handle_line(&line)? == Flow::Quit {
                        break;
                    }
                }
                Some(ticket) = advance_rx.recv() => self.handle_ticket(ticket)?,
            }
        }

        self.shutdown().await
    }

    /// Present the first question.
    pub fn start(&mut self) -> Result<()> {
        tracing::info!(
            user = %self.identity.display_name(),
            grading = self.session.settings().grading.as_str(),
            "session started"
        );
        writeln!(self.out, "Quiz for {}.", self.identity.display_name())?;
        writeln!(
            self.out,
            "Commands: :continue, :restart, :quit. Pick choices by number."
        )?;
        self.session.start();
        self.after_advance()
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        match Command::parse(line) {
            Command::Quit => {
                self.timer.cancel();
                return Ok(Flow::Quit);
            }
            Command::Restart => {
                self.timer.cancel();
                self.session.restart();
                tracing::info!(epoch = self.session.epoch(), "session restarted");
                writeln!(self.out, "Restarting.")?;
                self.after_advance()?;
            }
            Command::Continue => self.proceed()?,
            Command::Answer(text) => match self.session.phase() {
                Phase::Presenting => self.submit(&text)?,
                Phase::FeedbackIncorrect if text.trim().is_empty() => self.proceed()?,
                Phase::Completed => {
                    writeln!(self.out, "Session complete. Type :restart or :quit.")?;
                }
                Phase::Loading | Phase::FeedbackCorrect | Phase::FeedbackIncorrect => {}
            },
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    /// Redeem an auto-advance ticket; stale tickets are dropped.
    pub fn handle_ticket(&mut self, ticket: AdvanceTicket) -> Result<()> {
        match self.session.auto_advance(ticket) {
            Some(_) => self.after_advance(),
            None => {
                tracing::debug!(epoch = ticket.epoch(), "ignoring stale advance");
                Ok(())
            }
        }
    }

    fn submit(&mut self, text: &str) -> Result<()> {
        let answer = match self.session.current() {
            Some(question) => resolve_choice(question, text),
            None => return Ok(()),
        };

        match self.session.submit_answer(answer) {
            Some(SubmitOutcome::Correct { result, advance }) => {
                if matches!(result.kind, QuestionKind::MultipleChoice) {
                    writeln!(self.out, "Correct!")?;
                } else {
                    writeln!(self.out, "Correct! ({:.0}% match)", result.similarity * 100.0)?;
                }
                self.timer.schedule(advance, self.advance_tx.clone());
            }
            Some(SubmitOutcome::Incorrect { expected, .. }) => {
                writeln!(self.out, "Incorrect. Expected: {expected}")?;
                writeln!(self.out, "Press Enter or type :continue.")?;
            }
            Some(SubmitOutcome::Recorded { .. }) => self.after_advance()?,
            None => {}
        }
        Ok(())
    }

    fn proceed(&mut self) -> Result<()> {
        if self.session.proceed().is_some() {
            self.after_advance()?;
        }
        Ok(())
    }

    fn after_advance(&mut self) -> Result<()> {
        match self.session.phase() {
            Phase::Presenting => self.render_question()?,
            Phase::Completed => self.finish()?,
            Phase::Loading | Phase::FeedbackCorrect | Phase::FeedbackIncorrect => {}
        }
        self.out.flush()?;
        Ok(())
    }

    fn render_question(&mut self) -> Result<()> {
        let progress = self.session.progress();
        let Some(question) = self.session.current() else {
            return Ok(());
        };

        writeln!(self.out)?;
        writeln!(
            self.out,
            "[{}/{} correct, {} to retry] {}",
            progress.answered_correctly, progress.total, progress.retry_len, question.question
        )?;
        for (i, choice) in question.choices.iter().enumerate() {
            writeln!(self.out, "  {}) {}", i + 1, choice)?;
        }
        write!(self.out, "> ")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.out)?;
        match self.session.outcome() {
            Some(outcome) => {
                writeln!(self.out, "Score: {}/{}", outcome.score, outcome.total)?;
                let epoch = self.session.epoch();
                if self.submitted_epoch != Some(epoch) {
                    self.submitted_epoch = Some(epoch);
                    let handle = self.sink.submit_detached(&self.identity, outcome);
                    self.submissions.push(handle);
                }
            }
            None => {
                let progress = self.session.progress();
                writeln!(
                    self.out,
                    "All {} questions answered correctly after {} attempts.",
                    progress.total, progress.presented
                )?;
            }
        }
        tracing::info!(epoch = self.session.epoch(), "session completed");
        writeln!(self.out, "Type :restart to go again or :quit to exit.")?;
        Ok(())
    }

    /// Give in-flight submissions a short window to finish.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.timer.cancel();
        for handle in self.submissions.drain(..) {
            if tokio::time::timeout(SUBMIT_GRACE, handle).await.is_err() {
                tracing::warn!("result submission still pending at exit");
            }
        }
        self.out.flush()?;
        Ok(())
    }
}
