//! Database models and API types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, Result};

// Re-export shared types from quiz-core
pub use quiz_core::types::{GradingMode, QuestionId, SessionOutcome};

// === Database Entity Types ===

/// Registered quiz taker; the token is the user handle clients present.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub token: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Stored result of one completed quiz session
#[derive(Debug, Clone, FromRow)]
pub struct DbQuizResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub answers: Json<BTreeMap<QuestionId, String>>,
    pub score: i32,
    pub total: i32,
    pub grading: String,
    pub submitted_at: DateTime<Utc>,
}

impl DbQuizResult {
    /// Convert to API result record
    pub fn to_api_record(&self) -> ResultRecord {
        ResultRecord {
            id: self.id,
            user_id: self.user_id,
            answers: self.answers.0.clone(),
            score: self.score.max(0) as u32,
            total: self.total.max(0) as u32,
            grading: GradingMode::from_str(&self.grading).unwrap_or_default(),
            timestamp: self.submitted_at,
        }
    }
}

// === API Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub last_seen_at: DateTime<Utc>,
}

/// Final score record sent by a client when a session completes.
///
/// The server never re-grades; it stores what the client reports and
/// stamps the user and time itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResultRequest {
    pub answers: BTreeMap<QuestionId, String>,
    pub score: u32,
    pub total: u32,
    #[serde(default)]
    pub grading: GradingMode,
}

impl SubmitResultRequest {
    /// Reject records that cannot describe a real session.
    pub fn validate(&self) -> Result<()> {
        if self.total == 0 {
            return Err(ApiError::InvalidResult("total must be positive".to_string()));
        }
        if self.score > self.total {
            return Err(ApiError::InvalidResult(format!(
                "score {} exceeds total {}",
                self.score, self.total
            )));
        }
        if i32::try_from(self.total).is_err() {
            return Err(ApiError::InvalidResult("total is too large".to_string()));
        }
        Ok(())
    }
}

impl From<&SessionOutcome> for SubmitResultRequest {
    fn from(outcome: &SessionOutcome) -> Self {
        Self {
            answers: outcome.answers.clone(),
            score: outcome.score,
            total: outcome.total,
            grading: outcome.grading,
        }
    }
}

/// Stored result as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub answers: BTreeMap<QuestionId, String>,
    pub score: u32,
    pub total: u32,
    pub grading: GradingMode,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListResultsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResultsResponse {
    pub results: Vec<ResultRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(score: u32, total: u32) -> SubmitResultRequest {
        SubmitResultRequest {
            answers: BTreeMap::new(),
            score,
            total,
            grading: GradingMode::Batch,
        }
    }

    #[test]
    fn validate_accepts_perfect_score() {
        assert!(request(3, 3).validate().is_ok());
    }

    #[test]
    fn validate_rejects_score_above_total() {
        assert!(matches!(
            request(4, 3).validate(),
            Err(ApiError::InvalidResult(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_session() {
        assert!(matches!(
            request(0, 0).validate(),
            Err(ApiError::InvalidResult(_))
        ));
    }

    #[test]
    fn grading_defaults_when_missing() {
        let body = r#"{ "answers": { "1": "4" }, "score": 1, "total": 1 }"#;
        let parsed: SubmitResultRequest = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.grading, GradingMode::Incremental);
        assert_eq!(parsed.answers[&QuestionId::new("1")], "4");
    }

    #[test]
    fn db_row_converts_to_record() {
        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::new("fr"), "Paris".to_string());
        let row = DbQuizResult {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            answers: Json(answers),
            score: 1,
            total: 2,
            grading: "batch".to_string(),
            submitted_at: Utc::now(),
        };

        let record = row.to_api_record();
        assert_eq!(record.score, 1);
        assert_eq!(record.total, 2);
        assert_eq!(record.grading, GradingMode::Batch);
        assert_eq!(record.timestamp, row.submitted_at);
    }
}
