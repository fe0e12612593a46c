pub mod db;
pub mod error;
pub mod models;
pub mod routes;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let state = AppState { db: Arc::new(db) };

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router; protected routes require a bearer token.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/users/me", get(routes::identity::me))
        .route(
            "/api/results",
            get(routes::results::list).post(routes::results::submit),
        )
        .route("/api/results/:id", get(routes::results::get))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::identity::register))
        .merge(protected_routes)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
