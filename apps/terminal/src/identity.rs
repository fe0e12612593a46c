//! Signed-in user handle.
//!
//! With a backend configured the user is a registered token, cached on disk
//! and re-registered when the backend no longer recognises it. Without one,
//! a local user name from configuration is the identity.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::ResultClient;
use crate::config::Config;
use crate::error::ClientError;

/// The user a session's results are stamped with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: Option<String>,
    /// Bearer token when the user is registered with a backend.
    pub token: Option<String>,
}

impl Identity {
    pub fn local(name: &str) -> Self {
        Self {
            user_id: name.to_string(),
            name: Some(name.to_string()),
            token: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.user_id)
    }
}

/// Credentials persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub backend_url: String,
    pub user_id: String,
    pub token: String,
    pub name: Option<String>,
}

/// JSON file holding [`StoredCredentials`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("credentials.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored credentials; a missing file is not an error.
    pub fn load(&self) -> Result<Option<StoredCredentials>, ClientError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| ClientError::Credentials(e.to_string()))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ClientError::Credentials(e.to_string()))
    }

    pub fn save(&self, credentials: &StoredCredentials) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ClientError::Credentials(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(credentials)
            .map_err(|e| ClientError::Credentials(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| ClientError::Credentials(e.to_string()))
    }
}

/// Work out who is taking the quiz. `None` means nobody is signed in.
pub async fn resolve(
    config: &Config,
    client: Option<&ResultClient>,
    store: &CredentialStore,
) -> Result<Option<Identity>, ClientError> {
    let Some(client) = client else {
        return Ok(config.user.as_deref().map(Identity::local));
    };

    if let Some(saved) = store.load()? {
        if saved.backend_url == client.backend_url() {
            match client.whoami(&saved.token).await {
                Ok(me) => {
                    tracing::debug!(user_id = %me.user_id, "reusing stored credentials");
                    return Ok(Some(Identity {
                        user_id: me.user_id.to_string(),
                        name: me.name.or(saved.name),
                        token: Some(saved.token),
                    }));
                }
                Err(ClientError::NotAuthenticated) => {
                    tracing::info!("stored token rejected; registering again");
                }
                Err(e) => return Err(e),
            }
        }
    }

    let name = config.device_name.clone().or_else(|| config.user.clone());
    let registered = client.register(name.clone()).await?;
    let credentials = StoredCredentials {
        backend_url: client.backend_url().to_string(),
        user_id: registered.user_id.to_string(),
        token: registered.token,
        name,
    };
    store.save(&credentials)?;
    tracing::info!(user_id = %credentials.user_id, "registered with result store");

    Ok(Some(Identity {
        user_id: credentials.user_id,
        name: credentials.name,
        token: Some(credentials.token),
    }))
}
