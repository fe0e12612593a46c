//! Fire-and-forget submission of completed sessions.

use tokio::task::JoinHandle;

use quiz_core::SessionOutcome;

use crate::client::ResultClient;
use crate::identity::Identity;

/// Where completed session records go.
#[derive(Clone)]
pub enum ResultSink {
    /// Post to the result store backend.
    Remote(ResultClient),
    /// No backend configured; records are only logged.
    Local,
}

impl ResultSink {
    pub fn from_client(client: Option<ResultClient>) -> Self {
        client.map_or(Self::Local, Self::Remote)
    }

    /// Submit `outcome` in the background.
    ///
    /// Failures are logged and never reach the caller; the returned handle
    /// only exists so tests and shutdown can wait for the attempt.
    pub fn submit_detached(&self, identity: &Identity, outcome: &SessionOutcome) -> JoinHandle<()> {
        let outcome = outcome.clone();
        let user_id = identity.user_id.clone();

        match (self, identity.token.clone()) {
            (Self::Remote(client), Some(token)) => {
                let client = client.clone();
                tokio::spawn(async move {
                    match client.submit_result(&token, &outcome).await {
                        Ok(stored) => tracing::info!(
                            result_id = %stored.id,
                            score = stored.score,
                            total = stored.total,
                            "result submitted"
                        ),
                        Err(e) => tracing::warn!(
                            user_id = %user_id,
                            error = %e,
                            "failed to submit result"
                        ),
                    }
                })
            }
            _ => tokio::spawn(async move {
                tracing::info!(
                    user_id = %user_id,
                    score = outcome.score,
                    total = outcome.total,
                    grading = outcome.grading.as_str(),
                    "session completed (no result store configured)"
                );
            }),
        }
    }
}
