//! Point award and daily login endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/points/{user_id}/add?points&reason&reference_id
pub async fn add_points(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<AddPointsQuery>,
) -> Result<Json<EventOutcome>> {
    let outcome = state
        .engine
        .add_points(&user_id, query.points, query.reason, query.reference_id)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/daily-login/{user_id}
pub async fn daily_login(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DailyLoginResponse>> {
    let response = state.engine.handle_daily_login(&user_id).await?;
    Ok(Json(response))
}
