pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use progression_core::{default_achievements, default_levels, LevelTable};

use crate::db::Database;
use crate::services::engine::ProgressionEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub engine: Arc<ProgressionEngine>,
}

/// Build the API router for the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Stats routes
        .route("/api/stats/{user_id}", get(routes::stats::get_stats))
        .route("/api/stats/{user_id}/update", post(routes::stats::update_stats))
        // Points routes
        .route("/api/points/{user_id}/add", post(routes::points::add_points))
        .route("/api/daily-login/{user_id}", post(routes::points::daily_login))
        // Achievement routes
        .route("/api/achievements/{user_id}", get(routes::achievements::list))
        .route(
            "/api/achievements/{user_id}/{achievement_id}/mark-seen",
            post(routes::achievements::mark_seen),
        )
        // Level routes
        .route("/api/levels", get(routes::levels::list))
        // Summary routes
        .route("/api/summary/{user_id}", get(routes::summary::get_summary))
        // Checklist routes
        .route("/api/checklists", post(routes::checklists::create))
        .route("/api/checklists/{checklist_id}", get(routes::checklists::get))
        .route(
            "/api/checklists/{checklist_id}/items/{item_id}/status",
            put(routes::checklists::set_item_status),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect, migrate, seed and build the shared state.
pub async fn init_state(database_url: &str) -> anyhow::Result<AppState> {
    let db = Database::connect(database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    tracing::info!("Seeding level table and achievement catalog...");
    db.seed_levels(&default_levels()).await?;
    db.seed_achievements(&default_achievements()).await?;

    // Load the level table once; it is immutable seed data.
    let definitions: Vec<_> = db.get_levels().await?.iter().map(|l| l.to_definition()).collect();
    let levels = LevelTable::new(definitions)?;

    let db = Arc::new(db);
    let engine = Arc::new(ProgressionEngine::new(db.clone(), levels));

    Ok(AppState { db, engine })
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    tracing::info!("Connecting to database...");
    let state = init_state(&database_url).await?;

    let app = build_router(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
