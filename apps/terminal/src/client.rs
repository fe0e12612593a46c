//! HTTP client for the result store backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quiz_core::{GradingMode, QuestionId, SessionOutcome};

use crate::error::ClientError;

// === API Request/Response Types ===

#[derive(Debug, Serialize)]
struct RegisterRequest {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct WhoAmIResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResultRequest<'a> {
    answers: &'a BTreeMap<QuestionId, String>,
    score: u32,
    total: u32,
    grading: GradingMode,
}

/// Result record as stored by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: u32,
    pub total: u32,
    pub timestamp: DateTime<Utc>,
}

struct ResultClientInner {
    client: Client,
    backend_url: String,
}

/// Client for the result store API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ResultClient {
    inner: Arc<ResultClientInner>,
}

impl ResultClient {
    pub fn new(backend_url: &str) -> Self {
        Self {
            inner: Arc::new(ResultClientInner {
                client: Client::new(),
                backend_url: backend_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.inner.backend_url
    }

    /// Check if backend is reachable.
    pub async fn check_connectivity(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.inner.backend_url);
        match self.inner.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => Err(ClientError::Network(e.to_string())),
        }
    }

    /// Register a new user with the backend.
    pub async fn register(&self, name: Option<String>) -> Result<RegisterResponse, ClientError> {
        let url = format!("{}/api/users/register", self.inner.backend_url);

        let resp = self
            .inner
            .client
            .post(&url)
            .json(&RegisterRequest { name })
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Self::parse_json(resp).await
    }

    /// Look up the user owning `token`.
    pub async fn whoami(&self, token: &str) -> Result<WhoAmIResponse, ClientError> {
        let url = format!("{}/api/users/me", self.inner.backend_url);

        let resp = self
            .inner
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Self::parse_json(resp).await
    }

    /// Submit the final record of a completed session.
    pub async fn submit_result(
        &self,
        token: &str,
        outcome: &SessionOutcome,
    ) -> Result<StoredResult, ClientError> {
        let url = format!("{}/api/results", self.inner.backend_url);
        let request = SubmitResultRequest {
            answers: &outcome.answers,
            score: outcome.score,
            total: outcome.total,
            grading: outcome.grading,
        };

        let resp = self
            .inner
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Self::parse_json(resp).await
    }

    async fn parse_json<T: for<'de> Deserialize<'de>>(
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::NotAuthenticated);
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        resp.json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}
