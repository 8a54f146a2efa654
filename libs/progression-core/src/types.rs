//! Core types for the progression engine.

use serde::{Deserialize, Serialize};

/// Points awarded for completing a single checklist item.
pub const ITEM_COMPLETED_POINTS: i64 = 10;

/// Base points awarded for completing a whole skill checklist.
pub const SKILL_BASE_POINTS: i64 = 25;

/// Per-item bonus added to the skill completion reward.
pub const SKILL_PER_ITEM_POINTS: i64 = 5;

/// Points awarded for the first login of a calendar day.
pub const DAILY_LOGIN_POINTS: i64 = 10;

/// Reason a ledger entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointsReason {
    ItemCompleted,
    SkillCompleted,
    StreakBonus,
    AchievementUnlocked,
    DailyLogin,
}

impl PointsReason {
    /// Stable string form used for storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ItemCompleted => "item_completed",
            Self::SkillCompleted => "skill_completed",
            Self::StreakBonus => "streak_bonus",
            Self::AchievementUnlocked => "achievement_unlocked",
            Self::DailyLogin => "daily_login",
        }
    }

    /// Parse from the stored string form.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "item_completed" => Some(Self::ItemCompleted),
            "skill_completed" => Some(Self::SkillCompleted),
            "streak_bonus" => Some(Self::StreakBonus),
            "achievement_unlocked" => Some(Self::AchievementUnlocked),
            "daily_login" => Some(Self::DailyLogin),
            _ => None,
        }
    }
}

/// Achievement display category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Skill,
    Streak,
    General,
    Speed,
    Consistency,
}

impl AchievementCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Streak => "streak",
            Self::General => "general",
            Self::Speed => "speed",
            Self::Consistency => "consistency",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "skill" => Some(Self::Skill),
            "streak" => Some(Self::Streak),
            "general" => Some(Self::General),
            "speed" => Some(Self::Speed),
            "consistency" => Some(Self::Consistency),
            _ => None,
        }
    }
}

/// Metric an achievement condition is tested against.
///
/// `SpeedCompletion` exists for wire compatibility but no event currently
/// produces completion timing data, so it never fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    ItemCount,
    SkillCount,
    StreakDays,
    PointsTotal,
    SpeedCompletion,
}

impl ConditionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ItemCount => "item_count",
            Self::SkillCount => "skill_count",
            Self::StreakDays => "streak_days",
            Self::PointsTotal => "points_total",
            Self::SpeedCompletion => "speed_completion",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "item_count" => Some(Self::ItemCount),
            "skill_count" => Some(Self::SkillCount),
            "streak_days" => Some(Self::StreakDays),
            "points_total" => Some(Self::PointsTotal),
            "speed_completion" => Some(Self::SpeedCompletion),
            _ => None,
        }
    }
}

/// A single level threshold in the level table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub level: i32,
    pub points_required: i64,
    pub title: String,
    pub rewards: Vec<String>,
    pub color: String,
}

/// Derived level information for a point total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level: i32,
    /// Percentage of the way from the current threshold to the next (0-100).
    /// Zero when already at the highest defined level.
    pub progress_percent: f64,
    pub points_to_next: i64,
    pub next_level_title: String,
}

/// An achievement definition from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: AchievementCategory,
    pub condition_type: ConditionType,
    pub condition_value: i64,
    pub points_reward: i64,
    pub hidden: bool,
}

/// Point-in-time view of a user's aggregate, as seen by the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total_points: i64,
    pub streak_count: i32,
    pub longest_streak: i32,
    pub total_items_completed: i64,
    pub total_skills_completed: i64,
}
