//! PostgreSQL database operations

use chrono::NaiveDate;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use progression_core::{AchievementDefinition, LevelDefinition, LevelTable, PointsReason};

use crate::error::{ApiError, Result};
use crate::models::*;

/// New ledger entry to append
#[derive(Debug, Clone)]
pub struct NewPointsEntry {
    pub points: i64,
    pub reason: PointsReason,
    pub reference_id: Option<String>,
    pub metadata: serde_json::Value,
}

/// Streak fields computed by the engine for this event
#[derive(Debug, Clone, Copy)]
pub struct StreakFields {
    pub streak_count: i32,
    pub longest_streak: i32,
    pub last_active_date: NaiveDate,
}

/// Aggregate delta applied together with a ledger entry
#[derive(Debug, Clone, Default)]
pub struct ProgressDelta {
    pub points: i64,
    pub items_completed: i64,
    pub skills_completed: i64,
    pub streak: Option<StreakFields>,
}

const USER_STATS_COLUMNS: &str = r#"
    user_id, total_points, current_level, level_progress,
    streak_count, longest_streak, last_active_date,
    total_items_completed, total_skills_completed, created_at, updated_at
"#;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Stats Repository ===

    /// Get user stats row
    pub async fn get_user_stats(&self, user_id: &str) -> Result<Option<UserStatsRow>> {
        let row = sqlx::query_as::<_, UserStatsRow>(&format!(
            "SELECT {USER_STATS_COLUMNS} FROM user_stats WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Get user stats, creating a zeroed row on first contact
    pub async fn get_or_create_user_stats(&self, user_id: &str) -> Result<UserStatsRow> {
        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_user_stats(user_id)
            .await?
            .ok_or_else(|| ApiError::Internal(format!("user_stats row missing for {user_id}")))
    }

    /// Append a ledger entry and apply the aggregate delta atomically.
    ///
    /// Runs in a single transaction so the ledger and the aggregate can
    /// never disagree about total points. Point and counter changes are
    /// expressed as in-place increments, not read-modify-write. Cached
    /// level fields are recomputed from the updated total before commit.
    ///
    /// Returns the updated row and whether the event was applied. A ledger
    /// insert suppressed by the daily-login uniqueness index (a retry of an
    /// already-recorded day) rolls everything back and reports `false`.
    pub async fn record_progress_event(
        &self,
        user_id: &str,
        entry: Option<&NewPointsEntry>,
        delta: &ProgressDelta,
        levels: &LevelTable,
    ) -> Result<(UserStatsRow, bool)> {
        let mut tx = self.pool.begin().await?;

        match Self::apply_event_in_tx(&mut tx, user_id, entry, delta, levels).await? {
            Some(row) => {
                tx.commit().await?;
                Ok((row, true))
            }
            None => {
                tx.rollback().await?;
                let row = self.get_or_create_user_stats(user_id).await?;
                Ok((row, false))
            }
        }
    }

    /// Ledger insert plus aggregate increments plus level cache recompute,
    /// all on the caller's transaction. `None` when the daily-login
    /// uniqueness index suppressed the ledger insert.
    async fn apply_event_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: &str,
        entry: Option<&NewPointsEntry>,
        delta: &ProgressDelta,
        levels: &LevelTable,
    ) -> Result<Option<UserStatsRow>> {
        if let Some(entry) = entry {
            let inserted = sqlx::query(
                r#"
                INSERT INTO points_history (id, user_id, points, reason, reference_id, metadata)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (user_id, reference_id) WHERE reason = 'daily_login' DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(entry.points)
            .bind(entry.reason.as_str())
            .bind(&entry.reference_id)
            .bind(&entry.metadata)
            .execute(&mut **tx)
            .await?;

            if inserted.rows_affected() == 0 {
                return Ok(None);
            }
        }

        let mut row = match delta.streak {
            Some(streak) => {
                sqlx::query_as::<_, UserStatsRow>(&format!(
                    r#"
                    UPDATE user_stats SET
                        total_points = total_points + $2,
                        total_items_completed = total_items_completed + $3,
                        total_skills_completed = total_skills_completed + $4,
                        streak_count = $5,
                        longest_streak = $6,
                        last_active_date = $7,
                        updated_at = NOW()
                    WHERE user_id = $1
                    RETURNING {USER_STATS_COLUMNS}
                    "#
                ))
                .bind(user_id)
                .bind(delta.points)
                .bind(delta.items_completed)
                .bind(delta.skills_completed)
                .bind(streak.streak_count)
                .bind(streak.longest_streak)
                .bind(streak.last_active_date)
                .fetch_one(&mut **tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserStatsRow>(&format!(
                    r#"
                    UPDATE user_stats SET
                        total_points = total_points + $2,
                        total_items_completed = total_items_completed + $3,
                        total_skills_completed = total_skills_completed + $4,
                        updated_at = NOW()
                    WHERE user_id = $1
                    RETURNING {USER_STATS_COLUMNS}
                    "#
                ))
                .bind(user_id)
                .bind(delta.points)
                .bind(delta.items_completed)
                .bind(delta.skills_completed)
                .fetch_one(&mut **tx)
                .await?
            }
        };

        let info = levels.lookup(row.total_points);
        sqlx::query(
            r#"
            UPDATE user_stats
            SET current_level = $2, level_progress = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(info.level)
        .bind(info.progress_percent)
        .execute(&mut **tx)
        .await?;

        row.current_level = info.level;
        row.level_progress = info.progress_percent;
        Ok(Some(row))
    }

    // === Ledger Repository ===

    /// Most recent ledger entries for a user
    pub async fn get_recent_points(&self, user_id: &str, limit: i64) -> Result<Vec<PointsEntryRow>> {
        let entries = sqlx::query_as::<_, PointsEntryRow>(
            r#"
            SELECT id, user_id, points, reason, reference_id, metadata, created_at
            FROM points_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Sum of all ledger points for a user.
    ///
    /// The ledger is authoritative; this must always equal the aggregate's
    /// cached total.
    pub async fn sum_ledger_points(&self, user_id: &str) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(points), 0)::BIGINT
            FROM points_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    // === Achievement Catalog Repository ===

    /// All achievement definitions
    pub async fn get_achievements(&self) -> Result<Vec<AchievementRow>> {
        let rows = sqlx::query_as::<_, AchievementRow>(
            r#"
            SELECT id, name, description, icon, category, condition_type,
                   condition_value, points_reward, hidden, created_at
            FROM achievements
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Seed the achievement catalog if it is empty
    pub async fn seed_achievements(&self, definitions: &[AchievementDefinition]) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM achievements")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        for def in definitions {
            sqlx::query(
                r#"
                INSERT INTO achievements (id, name, description, icon, category,
                                          condition_type, condition_value, points_reward, hidden)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(&def.id)
            .bind(&def.name)
            .bind(&def.description)
            .bind(&def.icon)
            .bind(def.category.as_str())
            .bind(def.condition_type.as_str())
            .bind(def.condition_value)
            .bind(def.points_reward)
            .bind(def.hidden)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    // === Unlock Tracker Repository ===

    /// All unlock records for a user
    pub async fn get_unlocks(&self, user_id: &str) -> Result<Vec<UnlockRow>> {
        let unlocks = sqlx::query_as::<_, UnlockRow>(
            r#"
            SELECT id, user_id, achievement_id, unlocked_at, seen
            FROM user_achievements
            WHERE user_id = $1
            ORDER BY unlocked_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(unlocks)
    }

    /// Most recent unlocks for a user
    pub async fn get_recent_unlocks(&self, user_id: &str, limit: i64) -> Result<Vec<UnlockRow>> {
        let unlocks = sqlx::query_as::<_, UnlockRow>(
            r#"
            SELECT id, user_id, achievement_id, unlocked_at, seen
            FROM user_achievements
            WHERE user_id = $1
            ORDER BY unlocked_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(unlocks)
    }

    /// Record an unlock and its bonus ledger entry atomically, once per
    /// (user, achievement).
    ///
    /// Returns `None` when the unlock already exists; a duplicate grant
    /// attempt is a no-op, not an error. The unlock record, the bonus entry
    /// and the aggregate increment commit together, so a crash can never
    /// leave an unlock without its reward.
    pub async fn grant_unlock_with_bonus(
        &self,
        user_id: &str,
        achievement_id: &str,
        entry: Option<&NewPointsEntry>,
        levels: &LevelTable,
    ) -> Result<Option<(UnlockRow, UserStatsRow)>> {
        let mut tx = self.pool.begin().await?;

        let unlock = sqlx::query_as::<_, UnlockRow>(
            r#"
            INSERT INTO user_achievements (id, user_id, achievement_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, achievement_id) DO NOTHING
            RETURNING id, user_id, achievement_id, unlocked_at, seen
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(achievement_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(unlock) = unlock else {
            tx.rollback().await?;
            return Ok(None);
        };

        let delta = ProgressDelta {
            points: entry.map_or(0, |e| e.points),
            ..Default::default()
        };
        let row = Self::apply_event_in_tx(&mut tx, user_id, entry, &delta, levels)
            .await?
            .ok_or_else(|| {
                ApiError::Internal(format!("bonus entry suppressed for {achievement_id}"))
            })?;

        tx.commit().await?;
        Ok(Some((unlock, row)))
    }

    /// Flip the seen flag on an unlock record
    pub async fn mark_unlock_seen(&self, user_id: &str, achievement_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_achievements
            SET seen = TRUE
            WHERE user_id = $1 AND achievement_id = $2
            "#,
        )
        .bind(user_id)
        .bind(achievement_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Level Table Repository ===

    /// All level definitions in ascending order
    pub async fn get_levels(&self) -> Result<Vec<LevelRow>> {
        let levels = sqlx::query_as::<_, LevelRow>(
            r#"
            SELECT level, points_required, title, rewards, color
            FROM levels
            ORDER BY level
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }

    /// Seed the level table if it is empty
    pub async fn seed_levels(&self, definitions: &[LevelDefinition]) -> Result<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM levels")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(());
        }

        for def in definitions {
            sqlx::query(
                r#"
                INSERT INTO levels (level, points_required, title, rewards, color)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(def.level)
            .bind(def.points_required)
            .bind(&def.title)
            .bind(&def.rewards)
            .bind(&def.color)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    // === Checklist Repository ===

    /// Create a checklist with its items
    pub async fn create_checklist(
        &self,
        request: &CreateChecklistRequest,
    ) -> Result<(ChecklistRow, Vec<ChecklistItemRow>)> {
        let mut tx = self.pool.begin().await?;

        let checklist = sqlx::query_as::<_, ChecklistRow>(
            r#"
            INSERT INTO checklists (id, user_id, title, icon, color, goal)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, title, icon, color, goal, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.user_id)
        .bind(&request.title)
        .bind(request.icon.as_deref().unwrap_or("list"))
        .bind(request.color.as_deref().unwrap_or("#4CAF50"))
        .bind(request.goal.as_deref().unwrap_or(""))
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(request.items.len());
        for (position, text) in request.items.iter().enumerate() {
            let item = sqlx::query_as::<_, ChecklistItemRow>(
                r#"
                INSERT INTO checklist_items (id, checklist_id, text, position)
                VALUES ($1, $2, $3, $4)
                RETURNING id, checklist_id, text, position, completed, created_at, updated_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(checklist.id)
            .bind(text)
            .bind(position as i32)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok((checklist, items))
    }

    /// Get a checklist by id
    pub async fn get_checklist(&self, checklist_id: Uuid) -> Result<Option<ChecklistRow>> {
        let checklist = sqlx::query_as::<_, ChecklistRow>(
            r#"
            SELECT id, user_id, title, icon, color, goal, created_at, updated_at
            FROM checklists
            WHERE id = $1
            "#,
        )
        .bind(checklist_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(checklist)
    }

    /// All items of a checklist with their current status
    pub async fn get_checklist_items(&self, checklist_id: Uuid) -> Result<Vec<ChecklistItemRow>> {
        let items = sqlx::query_as::<_, ChecklistItemRow>(
            r#"
            SELECT id, checklist_id, text, position, completed, created_at, updated_at
            FROM checklist_items
            WHERE checklist_id = $1
            ORDER BY position
            "#,
        )
        .bind(checklist_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Get a single checklist item
    pub async fn get_checklist_item(
        &self,
        checklist_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<ChecklistItemRow>> {
        let item = sqlx::query_as::<_, ChecklistItemRow>(
            r#"
            SELECT id, checklist_id, text, position, completed, created_at, updated_at
            FROM checklist_items
            WHERE checklist_id = $1 AND id = $2
            "#,
        )
        .bind(checklist_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Write an item's completed flag, only when it actually changes.
    ///
    /// Returns `None` when the item is missing or already in the requested
    /// state; callers distinguish the two with a follow-up read. Guarding
    /// the write on the current value makes the transition detection
    /// atomic: of two concurrent identical writes, at most one sees an
    /// edge.
    pub async fn set_item_completed(
        &self,
        checklist_id: Uuid,
        item_id: Uuid,
        completed: bool,
    ) -> Result<Option<ChecklistItemRow>> {
        let item = sqlx::query_as::<_, ChecklistItemRow>(
            r#"
            UPDATE checklist_items
            SET completed = $3, updated_at = NOW()
            WHERE checklist_id = $1 AND id = $2 AND completed <> $3
            RETURNING id, checklist_id, text, position, completed, created_at, updated_at
            "#,
        )
        .bind(checklist_id)
        .bind(item_id)
        .bind(completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }
}
