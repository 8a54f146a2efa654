//! Progression engine: the orchestrator behind every domain event.
//!
//! Each external event (item completed, skill completed, daily login,
//! generic stat delta) appends to the points ledger, updates the per-user
//! aggregate, re-derives the level, and evaluates the achievement catalog
//! exactly once against the post-event aggregate.
//!
//! All mutating work for one user is serialized through a per-user async
//! mutex; different users proceed in parallel. The engine itself holds no
//! per-user state between calls.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use progression_core::{
    advance_streak, evaluate, unlock_progress, AchievementDefinition, LevelTable, PointsReason,
    ProgressSnapshot, DAILY_LOGIN_POINTS, ITEM_COMPLETED_POINTS, SKILL_BASE_POINTS,
    SKILL_PER_ITEM_POINTS,
};

use crate::db::{Database, NewPointsEntry, ProgressDelta, StreakFields};
use crate::error::{ApiError, Result};
use crate::models::*;

/// Largest point delta accepted from the generic update primitive.
const MAX_POINT_DELTA: i64 = 10_000;

/// Largest counter delta accepted from the generic update primitive.
const MAX_COUNTER_DELTA: i64 = 1_000;

pub struct ProgressionEngine {
    db: Arc<Database>,
    levels: LevelTable,
    user_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ProgressionEngine {
    pub fn new(db: Arc<Database>, levels: LevelTable) -> Self {
        Self {
            db,
            levels,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The validated level table loaded at startup.
    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    /// Per-user lock handle. Lock registry entries are never removed; the
    /// set of active users is small and bounded in practice.
    fn user_lock(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Current stats with level fields re-derived from the table.
    pub async fn stats(&self, user_id: &str) -> Result<UserStatsResponse> {
        validate_user_id(user_id)?;
        let row = self.db.get_or_create_user_stats(user_id).await?;
        let info = self.levels.lookup(row.total_points);
        Ok(row.to_response(&info))
    }

    /// Apply a generic stat delta as one external event.
    pub async fn apply_update(
        &self,
        user_id: &str,
        request: StatsUpdateRequest,
    ) -> Result<EventOutcome> {
        validate_user_id(user_id)?;
        validate_update(&request)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let (row, applied) = self
            .apply_core_event(
                user_id,
                request.reason.unwrap_or(PointsReason::StreakBonus),
                request.points_to_add,
                request.reference_id.clone(),
                json!({}),
                request.items_completed,
                request.skills_completed,
                request.touch_streak,
            )
            .await?;

        if !applied {
            // The ledger idempotency index suppressed the write (a replay
            // of an already-recorded day); nothing changed, so nothing to
            // award or evaluate.
            let info = self.levels.lookup(row.total_points);
            return Ok(EventOutcome {
                stats: row.to_response(&info),
                points_awarded: 0,
                newly_unlocked: Vec::new(),
            });
        }

        let newly_unlocked = self.evaluate_and_grant(user_id, &row.to_snapshot()).await?;
        let outcome = self
            .build_outcome(row, request.points_to_add, newly_unlocked)
            .await?;
        Ok(outcome)
    }

    /// Record a reason-tagged point award as one external event.
    pub async fn add_points(
        &self,
        user_id: &str,
        points: i64,
        reason: PointsReason,
        reference_id: Option<String>,
    ) -> Result<EventOutcome> {
        let request = StatsUpdateRequest {
            points_to_add: points,
            reason: Some(reason),
            reference_id,
            items_completed: if reason == PointsReason::ItemCompleted { 1 } else { 0 },
            skills_completed: if reason == PointsReason::SkillCompleted { 1 } else { 0 },
            touch_streak: matches!(
                reason,
                PointsReason::ItemCompleted
                    | PointsReason::SkillCompleted
                    | PointsReason::DailyLogin
            ),
        };
        self.apply_update(user_id, request).await
    }

    /// Write an item's completed flag and react to the transition.
    ///
    /// The write and the transition check both happen under the per-user
    /// lock, and the write itself is conditional on the current value, so
    /// concurrent duplicate requests cannot both observe the false -> true
    /// edge. Only that edge fires downstream effects; re-opening an item or
    /// re-writing the same status is durable but returns no outcome. On a
    /// qualifying transition the item award is applied first, then the
    /// checklist is re-read so the all-items-complete check sees the
    /// triggering write.
    pub async fn set_item_status(
        &self,
        user_id: &str,
        checklist_id: Uuid,
        item_id: Uuid,
        completed: bool,
    ) -> Result<(ChecklistItemRow, Option<EventOutcome>)> {
        validate_user_id(user_id)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let Some(item) = self
            .db
            .set_item_completed(checklist_id, item_id, completed)
            .await?
        else {
            // No edge: the item is already in the requested state, or it
            // does not exist at all.
            let item = self
                .db
                .get_checklist_item(checklist_id, item_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("item {item_id}")))?;
            return Ok((item, None));
        };

        if !item.completed {
            // Reopened; earlier awards are never clawed back.
            return Ok((item, None));
        }

        let (mut row, _) = self
            .apply_core_event(
                user_id,
                PointsReason::ItemCompleted,
                ITEM_COMPLETED_POINTS,
                Some(item_id.to_string()),
                json!({ "checklist_id": checklist_id }),
                1,
                0,
                true,
            )
            .await?;
        let mut points_awarded = ITEM_COMPLETED_POINTS;

        let items = self.db.get_checklist_items(checklist_id).await?;
        if !items.is_empty() && items.iter().all(|item| item.completed) {
            let reward = SKILL_BASE_POINTS + SKILL_PER_ITEM_POINTS * items.len() as i64;
            let (updated, _) = self
                .apply_core_event(
                    user_id,
                    PointsReason::SkillCompleted,
                    reward,
                    Some(checklist_id.to_string()),
                    json!({ "item_count": items.len() }),
                    0,
                    1,
                    true,
                )
                .await?;
            row = updated;
            points_awarded += reward;
        }

        let newly_unlocked = self.evaluate_and_grant(user_id, &row.to_snapshot()).await?;
        let outcome = self.build_outcome(row, points_awarded, newly_unlocked).await?;
        Ok((item, Some(outcome)))
    }

    /// First login of the day awards a bonus and touches the streak.
    ///
    /// Safe to call any number of times per day; repeats are reported as
    /// `already_completed_today` without side effects.
    pub async fn handle_daily_login(&self, user_id: &str) -> Result<DailyLoginResponse> {
        validate_user_id(user_id)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let current = self.db.get_or_create_user_stats(user_id).await?;
        let today = Utc::now().date_naive();
        let new_day = current.last_active_date.map_or(true, |last| last < today);

        if !new_day && current.streak_count != 0 {
            let info = self.levels.lookup(current.total_points);
            return Ok(DailyLoginResponse {
                already_completed_today: true,
                points_awarded: 0,
                current_streak: current.streak_count,
                stats: current.to_response(&info),
                newly_unlocked: Vec::new(),
            });
        }

        let (row, applied) = self
            .apply_core_event(
                user_id,
                PointsReason::DailyLogin,
                DAILY_LOGIN_POINTS,
                Some(format!("daily_login_{today}")),
                json!({}),
                0,
                0,
                true,
            )
            .await?;

        if !applied {
            // A retry raced an already-recorded login for this day.
            let info = self.levels.lookup(row.total_points);
            return Ok(DailyLoginResponse {
                already_completed_today: true,
                points_awarded: 0,
                current_streak: row.streak_count,
                stats: row.to_response(&info),
                newly_unlocked: Vec::new(),
            });
        }

        let newly_unlocked = self.evaluate_and_grant(user_id, &row.to_snapshot()).await?;
        let outcome = self
            .build_outcome(row, DAILY_LOGIN_POINTS, newly_unlocked)
            .await?;
        Ok(DailyLoginResponse {
            already_completed_today: false,
            points_awarded: DAILY_LOGIN_POINTS,
            current_streak: outcome.stats.streak_count,
            stats: outcome.stats,
            newly_unlocked: outcome.newly_unlocked,
        })
    }

    /// Full catalog with per-user unlock state and progress percent.
    ///
    /// Hidden achievements are omitted until unlocked. Catalog rows with an
    /// unknown category or condition type are logged and skipped, never
    /// fatal to the request.
    pub async fn achievements_with_progress(
        &self,
        user_id: &str,
    ) -> Result<Vec<AchievementWithProgress>> {
        validate_user_id(user_id)?;

        let stats = self.db.get_or_create_user_stats(user_id).await?;
        let snapshot = stats.to_snapshot();
        let catalog = self.load_catalog().await?;
        let unlocks: HashMap<String, UnlockRow> = self
            .db
            .get_unlocks(user_id)
            .await?
            .into_iter()
            .map(|u| (u.achievement_id.clone(), u))
            .collect();

        // An unlock pointing at a retired catalog entry is an
        // inconsistency, not a request failure: log it and move on.
        for id in unlocks.keys() {
            if !catalog.iter().any(|def| def.id == *id) {
                tracing::warn!(
                    user_id,
                    achievement_id = %id,
                    "unlock record has no catalog entry; skipping"
                );
            }
        }

        let list = catalog
            .into_iter()
            .filter_map(|def| {
                let unlock = unlocks.get(&def.id);
                if def.hidden && unlock.is_none() {
                    return None;
                }
                let progress = unlock_progress(&def, &snapshot, unlock.is_some());
                Some(AchievementWithProgress {
                    id: def.id,
                    name: def.name,
                    description: def.description,
                    icon: def.icon,
                    category: def.category,
                    condition_type: def.condition_type,
                    condition_value: def.condition_value,
                    points_reward: def.points_reward,
                    hidden: def.hidden,
                    is_unlocked: unlock.is_some(),
                    progress,
                    unlocked_at: unlock.map(|u| u.unlocked_at),
                    seen: unlock.map(|u| u.seen),
                })
            })
            .collect();

        Ok(list)
    }

    /// One ledger append plus the matching aggregate delta.
    ///
    /// Streak fields are derived here from the pre-event row; the whole
    /// write is a single transaction in the db layer.
    #[allow(clippy::too_many_arguments)]
    async fn apply_core_event(
        &self,
        user_id: &str,
        reason: PointsReason,
        points: i64,
        reference_id: Option<String>,
        metadata: serde_json::Value,
        items_completed: i64,
        skills_completed: i64,
        touches_streak: bool,
    ) -> Result<(UserStatsRow, bool)> {
        let current = self.db.get_or_create_user_stats(user_id).await?;

        let streak = touches_streak.then(|| {
            let today = Utc::now().date_naive();
            let update = advance_streak(
                current.last_active_date,
                today,
                current.streak_count,
                current.longest_streak,
            );
            StreakFields {
                streak_count: update.streak,
                longest_streak: update.longest,
                last_active_date: today,
            }
        });

        let entry = (points != 0).then_some(NewPointsEntry {
            points,
            reason,
            reference_id,
            metadata,
        });

        let delta = ProgressDelta {
            points,
            items_completed,
            skills_completed,
            streak,
        };

        self.db
            .record_progress_event(user_id, entry.as_ref(), &delta, &self.levels)
            .await
    }

    /// Evaluate the catalog against a post-event snapshot and grant what is
    /// newly satisfied.
    ///
    /// Runs once per external event. Bonus points recorded here are applied
    /// after the snapshot was taken, so one unlock can never chain into
    /// another within the same pass.
    async fn evaluate_and_grant(
        &self,
        user_id: &str,
        snapshot: &ProgressSnapshot,
    ) -> Result<Vec<UnlockedAchievement>> {
        let catalog = self.load_catalog().await?;
        let unlocked: HashSet<String> = self
            .db
            .get_unlocks(user_id)
            .await?
            .into_iter()
            .map(|u| u.achievement_id)
            .collect();

        let mut granted = Vec::new();
        for definition in evaluate(&catalog, &unlocked, snapshot) {
            let entry = NewPointsEntry {
                points: definition.points_reward,
                reason: PointsReason::AchievementUnlocked,
                reference_id: Some(definition.id.clone()),
                metadata: json!({ "achievement_name": definition.name }),
            };

            // The unique index makes a duplicate grant attempt a silent
            // no-op; the unlock record and its bonus commit together.
            let Some((unlock, _)) = self
                .db
                .grant_unlock_with_bonus(user_id, &definition.id, Some(&entry), &self.levels)
                .await?
            else {
                continue;
            };

            tracing::info!(
                user_id,
                achievement_id = %definition.id,
                points = definition.points_reward,
                "achievement unlocked"
            );

            granted.push(UnlockedAchievement {
                id: definition.id.clone(),
                name: definition.name.clone(),
                points_reward: definition.points_reward,
                unlocked_at: unlock.unlocked_at,
            });
        }

        Ok(granted)
    }

    /// Catalog rows converted to core definitions, skipping malformed rows.
    async fn load_catalog(&self) -> Result<Vec<AchievementDefinition>> {
        let rows = self.db.get_achievements().await?;
        let mut catalog = Vec::with_capacity(rows.len());
        for row in rows {
            match row.to_definition() {
                Some(definition) => catalog.push(definition),
                None => tracing::warn!(
                    achievement_id = %row.id,
                    category = %row.category,
                    condition_type = %row.condition_type,
                    "skipping achievement with unrecognized category or condition type"
                ),
            }
        }
        Ok(catalog)
    }

    /// Final outcome for a processed event. When unlock bonuses were
    /// granted after the snapshot, the aggregate is re-read so the response
    /// totals include them.
    async fn build_outcome(
        &self,
        row: UserStatsRow,
        points_awarded: i64,
        newly_unlocked: Vec<UnlockedAchievement>,
    ) -> Result<EventOutcome> {
        let row = if newly_unlocked.is_empty() {
            row
        } else {
            self.db.get_or_create_user_stats(&row.user_id).await?
        };
        let info = self.levels.lookup(row.total_points);
        Ok(EventOutcome {
            stats: row.to_response(&info),
            points_awarded,
            newly_unlocked,
        })
    }
}

fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() || user_id.len() > 128 {
        return Err(ApiError::InvalidInput("invalid user id".to_string()));
    }
    Ok(())
}

fn validate_update(request: &StatsUpdateRequest) -> Result<()> {
    if request.points_to_add.abs() > MAX_POINT_DELTA {
        return Err(ApiError::InvalidInput(format!(
            "point delta out of range (max {MAX_POINT_DELTA})"
        )));
    }
    if request.points_to_add != 0 && request.reason.is_none() {
        return Err(ApiError::InvalidInput(
            "reason is required when points_to_add is set".to_string(),
        ));
    }
    if !(0..=MAX_COUNTER_DELTA).contains(&request.items_completed)
        || !(0..=MAX_COUNTER_DELTA).contains(&request.skills_completed)
    {
        return Err(ApiError::InvalidInput(
            "counter delta out of range".to_string(),
        ));
    }
    Ok(())
}
