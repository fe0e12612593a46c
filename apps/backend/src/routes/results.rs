//! Quiz result endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::db::MAX_RESULTS_PAGE;
use crate::error::{ApiError, Result};
use crate::models::{ListResultsQuery, ListResultsResponse, ResultRecord, SubmitResultRequest};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/results
pub async fn submit(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<SubmitResultRequest>,
) -> Result<Json<ResultRecord>> {
    payload.validate()?;

    let stored = state.db.insert_result(auth.user_id, &payload).await?;

    tracing::info!(
        user_id = %auth.user_id,
        result_id = %stored.id,
        score = payload.score,
        total = payload.total,
        grading = payload.grading.as_str(),
        "stored quiz result"
    );

    Ok(Json(stored.to_api_record()))
}

/// GET /api/results
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<ListResultsQuery>,
) -> Result<Json<ListResultsResponse>> {
    let limit = query.limit.unwrap_or(MAX_RESULTS_PAGE);
    let results = state.db.list_results(auth.user_id, limit).await?;

    Ok(Json(ListResultsResponse {
        results: results.iter().map(|r| r.to_api_record()).collect(),
    }))
}

/// GET /api/results/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(result_id): Path<Uuid>,
) -> Result<Json<ResultRecord>> {
    let result = state
        .db
        .get_result(auth.user_id, result_id)
        .await?
        .ok_or_else(|| ApiError::ResultNotFound(result_id))?;

    Ok(Json(result.to_api_record()))
}
