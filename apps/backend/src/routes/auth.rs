//! Authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::AppState;

/// Authenticated user stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub token: String,
}

/// Resolves the bearer token to a user before protected handlers run
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request)?;

    let user = state
        .db
        .get_user_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("unknown user token"))?;

    state.db.update_last_seen(user.id).await?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
        token,
    });

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request<Body>) -> Result<String> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized("expected a Bearer token"))
}
