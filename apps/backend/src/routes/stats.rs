//! User stats endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/stats/{user_id}
pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserStatsResponse>> {
    let stats = state.engine.stats(&user_id).await?;
    Ok(Json(stats))
}

/// POST /api/stats/{user_id}/update
///
/// Low-level primitive: apply a generic stat delta as one event.
pub async fn update_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<StatsUpdateRequest>,
) -> Result<Json<EventOutcome>> {
    let outcome = state.engine.apply_update(&user_id, request).await?;
    Ok(Json(outcome))
}
