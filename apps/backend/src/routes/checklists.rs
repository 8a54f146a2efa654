//! Checklist collaborator endpoints.
//!
//! Storage for checklists is deliberately thin; its one interesting edge
//! is the item status write, which feeds the progression engine on a
//! completion transition.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

/// POST /api/checklists
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateChecklistRequest>,
) -> Result<(StatusCode, Json<ChecklistResponse>)> {
    if request.user_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("user_id must not be empty".to_string()));
    }
    if request.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("title must not be empty".to_string()));
    }

    let (checklist, items) = state.db.create_checklist(&request).await?;
    Ok((StatusCode::CREATED, Json(ChecklistResponse { checklist, items })))
}

/// GET /api/checklists/{checklist_id}
pub async fn get(
    State(state): State<AppState>,
    Path(checklist_id): Path<Uuid>,
) -> Result<Json<ChecklistResponse>> {
    let checklist = state
        .db
        .get_checklist(checklist_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("checklist {checklist_id}")))?;
    let items = state.db.get_checklist_items(checklist_id).await?;

    Ok(Json(ChecklistResponse { checklist, items }))
}

/// PUT /api/checklists/{checklist_id}/items/{item_id}/status
///
/// The engine owns the write: transition detection and the resulting
/// awards all happen inside its per-user critical section.
pub async fn set_item_status(
    State(state): State<AppState>,
    Path((checklist_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ItemStatusRequest>,
) -> Result<Json<ItemStatusResponse>> {
    let checklist = state
        .db
        .get_checklist(checklist_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("checklist {checklist_id}")))?;

    let (item, outcome) = state
        .engine
        .set_item_status(&checklist.user_id, checklist_id, item_id, request.completed)
        .await?;

    Ok(Json(ItemStatusResponse {
        item,
        transition: outcome.is_some(),
        outcome,
    }))
}
