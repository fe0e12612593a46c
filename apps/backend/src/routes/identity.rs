//! User registration and identity endpoints

use axum::{extract::State, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::{RegisterRequest, RegisterResponse, WhoAmIResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/users/register
/// Creates a new user and returns its token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Option<RegisterRequest>>,
) -> Result<Json<RegisterResponse>> {
    let name = payload.and_then(|p| p.name);
    let user = state.db.create_user(name.as_deref()).await?;

    tracing::info!(user_id = %user.id, "registered new user");

    Ok(Json(RegisterResponse {
        user_id: user.id,
        token: user.token,
    }))
}

/// GET /api/users/me
pub async fn me(
    Extension(auth): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<WhoAmIResponse>> {
    let user = state
        .db
        .get_user_by_token(&auth.token)
        .await?
        .ok_or_else(|| ApiError::UserNotFound(auth.user_id))?;

    Ok(Json(WhoAmIResponse {
        user_id: user.id,
        name: user.name,
        last_seen_at: user.last_seen_at,
    }))
}
