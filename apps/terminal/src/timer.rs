//! Cancellable auto-advance timer.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use quiz_core::AdvanceTicket;

/// At most one scheduled advance at a time; scheduling again or cancelling
/// aborts the previous one.
#[derive(Debug, Default)]
pub struct AdvanceTimer {
    task: Option<JoinHandle<()>>,
}

impl AdvanceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `ticket` on `tx` once its delay has elapsed.
    pub fn schedule(&mut self, ticket: AdvanceTicket, tx: UnboundedSender<AdvanceTicket>) {
        self.cancel();
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(ticket.delay).await;
            let _ = tx.send(ticket);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for AdvanceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
