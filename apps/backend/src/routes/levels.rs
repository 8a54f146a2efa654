//! Level table endpoint

use axum::{extract::State, Json};

use crate::models::*;
use crate::AppState;

/// GET /api/levels
///
/// Served from the table validated at startup; the seed rows in the
/// database never change after that.
pub async fn list(State(state): State<AppState>) -> Json<Vec<LevelDefinition>> {
    Json(state.engine.levels().levels().to_vec())
}
