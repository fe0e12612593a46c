//! PostgreSQL database operations

use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Maximum number of results returned by one listing.
pub const MAX_RESULTS_PAGE: i64 = 100;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with generated token
    pub async fn create_user(&self, name: Option<&str>) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (token, name)
            VALUES ($1, $2)
            RETURNING id, token, name, created_at, last_seen_at
            "#,
        )
        .bind(&token)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, token, name, created_at, last_seen_at
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET last_seen_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // === Result Repository ===

    /// Store a submitted result; the timestamp is assigned by the database.
    pub async fn insert_result(
        &self,
        user_id: Uuid,
        request: &SubmitResultRequest,
    ) -> Result<DbQuizResult> {
        let result = sqlx::query_as::<_, DbQuizResult>(
            r#"
            INSERT INTO quiz_results (id, user_id, answers, score, total, grading)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, answers, score, total, grading, submitted_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Json(&request.answers))
        .bind(request.score as i32)
        .bind(request.total as i32)
        .bind(request.grading.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    /// List a user's results, newest first
    pub async fn list_results(&self, user_id: Uuid, limit: i64) -> Result<Vec<DbQuizResult>> {
        let results = sqlx::query_as::<_, DbQuizResult>(
            r#"
            SELECT id, user_id, answers, score, total, grading, submitted_at
            FROM quiz_results
            WHERE user_id = $1
            ORDER BY submitted_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit.clamp(1, MAX_RESULTS_PAGE))
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    /// Get a single result owned by `user_id`
    pub async fn get_result(&self, user_id: Uuid, result_id: Uuid) -> Result<Option<DbQuizResult>> {
        let result = sqlx::query_as::<_, DbQuizResult>(
            r#"
            SELECT id, user_id, answers, score, total, grading, submitted_at
            FROM quiz_results
            WHERE user_id = $1 AND id = $2
            "#,
        )
        .bind(user_id)
        .bind(result_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }
}
