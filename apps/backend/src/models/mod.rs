//! Database models and API types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// Re-export shared types from progression-core
pub use progression_core::types::{
    AchievementCategory, AchievementDefinition, ConditionType, LevelDefinition, LevelInfo,
    PointsReason, ProgressSnapshot,
};

// === Database Entity Types ===

/// Per-user progress aggregate row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserStatsRow {
    pub user_id: String,
    pub total_points: i64,
    pub current_level: i32,
    pub level_progress: f64,
    pub streak_count: i32,
    pub longest_streak: i32,
    pub last_active_date: Option<NaiveDate>,
    pub total_items_completed: i64,
    pub total_skills_completed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserStatsRow {
    /// Snapshot view for achievement evaluation.
    pub fn to_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_points: self.total_points,
            streak_count: self.streak_count,
            longest_streak: self.longest_streak,
            total_items_completed: self.total_items_completed,
            total_skills_completed: self.total_skills_completed,
        }
    }

    /// Build the API response using freshly derived level info.
    ///
    /// The cached `current_level`/`level_progress` columns are never
    /// trusted on read; the caller re-derives them from the level table.
    pub fn to_response(&self, info: &LevelInfo) -> UserStatsResponse {
        UserStatsResponse {
            user_id: self.user_id.clone(),
            total_points: self.total_points,
            current_level: info.level,
            level_progress: info.progress_percent,
            points_to_next_level: info.points_to_next,
            next_level_title: info.next_level_title.clone(),
            streak_count: self.streak_count,
            longest_streak: self.longest_streak,
            last_active_date: self.last_active_date,
            total_items_completed: self.total_items_completed,
            total_skills_completed: self.total_skills_completed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Ledger entry row (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PointsEntryRow {
    pub id: Uuid,
    pub user_id: String,
    pub points: i64,
    pub reason: String,
    pub reference_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Achievement definition row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AchievementRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: String,
    pub condition_type: String,
    pub condition_value: i64,
    pub points_reward: i64,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl AchievementRow {
    /// Convert to the core definition. `None` when the stored category or
    /// condition type is unknown; callers log and skip such rows.
    pub fn to_definition(&self) -> Option<AchievementDefinition> {
        Some(AchievementDefinition {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            category: AchievementCategory::from_str(&self.category)?,
            condition_type: ConditionType::from_str(&self.condition_type)?,
            condition_value: self.condition_value,
            points_reward: self.points_reward,
            hidden: self.hidden,
        })
    }
}

/// Unlock record row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UnlockRow {
    pub id: Uuid,
    pub user_id: String,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
    pub seen: bool,
}

/// Level definition row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LevelRow {
    pub level: i32,
    pub points_required: i64,
    pub title: String,
    pub rewards: Vec<String>,
    pub color: String,
}

impl LevelRow {
    pub fn to_definition(&self) -> LevelDefinition {
        LevelDefinition {
            level: self.level,
            points_required: self.points_required,
            title: self.title.clone(),
            rewards: self.rewards.clone(),
            color: self.color.clone(),
        }
    }
}

/// Checklist (skill) row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChecklistRow {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub icon: String,
    pub color: String,
    pub goal: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checklist item row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChecklistItemRow {
    pub id: Uuid,
    pub checklist_id: Uuid,
    pub text: String,
    pub position: i32,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// === API Request/Response Types ===

/// User stats with derived level fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsResponse {
    pub user_id: String,
    pub total_points: i64,
    pub current_level: i32,
    pub level_progress: f64,
    pub points_to_next_level: i64,
    pub next_level_title: String,
    pub streak_count: i32,
    pub longest_streak: i32,
    pub last_active_date: Option<NaiveDate>,
    pub total_items_completed: i64,
    pub total_skills_completed: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generic stat delta; the low-level update primitive
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StatsUpdateRequest {
    #[serde(default)]
    pub points_to_add: i64,
    pub reason: Option<PointsReason>,
    pub reference_id: Option<String>,
    #[serde(default)]
    pub items_completed: i64,
    #[serde(default)]
    pub skills_completed: i64,
    #[serde(default)]
    pub touch_streak: bool,
}

/// Query parameters for POST /api/points/{user_id}/add
#[derive(Debug, Serialize, Deserialize)]
pub struct AddPointsQuery {
    pub points: i64,
    pub reason: PointsReason,
    pub reference_id: Option<String>,
}

/// An achievement granted during the current request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub id: String,
    pub name: String,
    pub points_reward: i64,
    pub unlocked_at: DateTime<Utc>,
}

/// Result of one processed progression event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    pub stats: UserStatsResponse,
    pub points_awarded: i64,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// Catalog entry with per-user unlock state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementWithProgress {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub condition_type: ConditionType,
    pub condition_value: i64,
    pub points_reward: i64,
    pub hidden: bool,
    pub is_unlocked: bool,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen: Option<bool>,
}

/// Response for POST /api/daily-login/{user_id}
#[derive(Debug, Serialize, Deserialize)]
pub struct DailyLoginResponse {
    pub already_completed_today: bool,
    pub points_awarded: i64,
    pub current_streak: i32,
    pub stats: UserStatsResponse,
    pub newly_unlocked: Vec<UnlockedAchievement>,
}

/// Response for GET /api/summary/{user_id}
#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub stats: UserStatsResponse,
    pub recent_achievements: Vec<UnlockRow>,
    pub next_achievements: Vec<AchievementWithProgress>,
    pub recent_points: Vec<PointsEntryRow>,
}

// Checklist types

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateChecklistRequest {
    pub user_id: String,
    pub title: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub goal: Option<String>,
    pub items: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChecklistResponse {
    #[serde(flatten)]
    pub checklist: ChecklistRow,
    pub items: Vec<ChecklistItemRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemStatusRequest {
    pub completed: bool,
}

/// Response for an item status write. `outcome` is present only when the
/// write was a completion transition that fed the progression engine.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemStatusResponse {
    pub item: ChecklistItemRow,
    pub transition: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<EventOutcome>,
}
