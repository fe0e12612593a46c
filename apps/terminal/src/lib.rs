pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod results;
pub mod shell;
pub mod timer;

use anyhow::{bail, Context};
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_core::{QuestionSource, QuizSession};

use crate::client::ResultClient;
use crate::config::Config;
use crate::identity::{CredentialStore, Identity};
use crate::results::ResultSink;
use crate::shell::Shell;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the quiz on stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    let source = QuestionSource::load(&config.questions).with_context(|| {
        format!("failed to load questions from {}", config.questions.display())
    })?;
    tracing::info!(
        path = %config.questions.display(),
        count = source.len(),
        "questions loaded"
    );

    let client = config.backend_url.as_deref().map(ResultClient::new);
    let (identity, sink) = sign_in(&config, client).await?;

    let session = QuizSession::new(&source, config.session_settings());
    let mut shell = Shell::new(session, identity, sink, std::io::stdout());
    shell.run(BufReader::new(tokio::io::stdin())).await
}

/// Resolve the user, falling back to the local name when the backend is unreachable.
async fn sign_in(
    config: &Config,
    client: Option<ResultClient>,
) -> anyhow::Result<(Identity, ResultSink)> {
    let store = CredentialStore::new(&config.data_dir);
    let client = match client {
        Some(client) => reachable(client).await,
        None => None,
    };

    let resolved = match identity::resolve(config, client.as_ref(), &store).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "sign-in failed; results will not be saved");
            config.user.as_deref().map(Identity::local)
        }
    };

    let Some(identity) = resolved else {
        bail!("nobody is signed in: set QUIZ_USER or QUIZ_BACKEND_URL");
    };

    let sink = if identity.is_authenticated() {
        ResultSink::from_client(client)
    } else {
        ResultSink::Local
    };
    Ok((identity, sink))
}

/// Keep `client` only if its health check answers.
async fn reachable(client: ResultClient) -> Option<ResultClient> {
    match client.check_connectivity().await {
        Ok(true) => Some(client),
        Ok(false) => {
            tracing::warn!(
                url = client.backend_url(),
                "result store is unhealthy; results will not be saved"
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                url = client.backend_url(),
                error = %e,
                "result store unreachable; results will not be saved"
            );
            None
        }
    }
}
