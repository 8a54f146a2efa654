//! Core progression library shared by the backend service.
//!
//! Provides:
//! - Level table lookup (points -> level, progress, points to next)
//! - Activity streak derivation over calendar days
//! - Achievement condition evaluation and unlock progress
//! - Shared types (PointsReason, AchievementDefinition, ProgressSnapshot, etc.)

pub mod achievement;
pub mod error;
pub mod level;
pub mod streak;
pub mod types;

pub use achievement::{default_achievements, evaluate, is_satisfied, unlock_progress};
pub use error::{LevelTableError, Result};
pub use level::{default_levels, LevelTable};
pub use streak::{advance_streak, StreakUpdate};
pub use types::{
    AchievementCategory, AchievementDefinition, ConditionType, LevelDefinition, LevelInfo,
    PointsReason, ProgressSnapshot, DAILY_LOGIN_POINTS, ITEM_COMPLETED_POINTS,
    SKILL_BASE_POINTS, SKILL_PER_ITEM_POINTS,
};
