//! Summary endpoint

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::AppState;

const RECENT_UNLOCKS_LIMIT: i64 = 10;
const NEXT_ACHIEVEMENTS_LIMIT: usize = 5;
const RECENT_POINTS_LIMIT: i64 = 20;

/// GET /api/summary/{user_id}
///
/// Stats plus recent unlocks, near-unlock achievements and recent ledger
/// activity. The side lists degrade to empty on a transient storage
/// failure; the aggregate itself is always returned.
pub async fn get_summary(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<SummaryResponse>> {
    let stats = state.engine.stats(&user_id).await?;

    let recent_achievements = degrade_transient(
        state.db.get_recent_unlocks(&user_id, RECENT_UNLOCKS_LIMIT).await,
        &user_id,
        "recent unlocks",
    )?;

    let next_achievements = degrade_transient(
        state.engine.achievements_with_progress(&user_id).await,
        &user_id,
        "near-unlock achievements",
    )?
    .map(|all| {
        let mut close: Vec<AchievementWithProgress> = all
            .into_iter()
            .filter(|a| !a.is_unlocked && a.progress >= 50.0)
            .collect();
        close.sort_by(|a, b| {
            b.progress
                .partial_cmp(&a.progress)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        close.truncate(NEXT_ACHIEVEMENTS_LIMIT);
        close
    })
    .unwrap_or_default();

    let recent_points = degrade_transient(
        state.db.get_recent_points(&user_id, RECENT_POINTS_LIMIT).await,
        &user_id,
        "recent points",
    )?;

    Ok(Json(SummaryResponse {
        stats,
        recent_achievements: recent_achievements.unwrap_or_default(),
        next_achievements,
        recent_points: recent_points.unwrap_or_default(),
    }))
}

/// Transient failures of a side list are logged and reported as `None`
/// (rendered empty); anything else still fails the request.
fn degrade_transient<T>(
    result: Result<T>,
    user_id: &str,
    section: &str,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_retryable() => {
            tracing::warn!(user_id, section, error = %e, "summary section degraded to empty");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degrade_transient_passes_values() {
        let result = degrade_transient(Ok(vec![1, 2, 3]), "martin", "test");
        assert_eq!(result.unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_degrade_transient_swallows_retryable() {
        let result: Result<Option<Vec<i32>>> = degrade_transient(
            Err(ApiError::Transient("pool exhausted".to_string())),
            "martin",
            "test",
        );
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_degrade_transient_propagates_fatal() {
        let result: Result<Option<Vec<i32>>> = degrade_transient(
            Err(ApiError::Internal("boom".to_string())),
            "martin",
            "test",
        );
        assert!(result.is_err());
    }
}
