//! Achievement endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// GET /api/achievements/{user_id}
pub async fn list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AchievementWithProgress>>> {
    let achievements = state.engine.achievements_with_progress(&user_id).await?;
    Ok(Json(achievements))
}

/// POST /api/achievements/{user_id}/{achievement_id}/mark-seen
pub async fn mark_seen(
    State(state): State<AppState>,
    Path((user_id, achievement_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>> {
    let updated = state.db.mark_unlock_seen(&user_id, &achievement_id).await?;
    if !updated {
        return Err(ApiError::NotFound(format!(
            "no unlock record for achievement {achievement_id}"
        )));
    }
    Ok(Json(serde_json::json!({ "seen": true })))
}
