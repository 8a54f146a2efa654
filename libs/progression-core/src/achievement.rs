//! Achievement condition evaluation.
//!
//! Pure functions over a catalog, an already-unlocked set, and a progress
//! snapshot. Persistence of unlock records and reward points stays with the
//! caller.

use std::collections::HashSet;

use crate::types::{AchievementCategory, AchievementDefinition, ConditionType, ProgressSnapshot};

/// Counter value the condition is tested against, if one exists.
///
/// `SpeedCompletion` has no data source (no event carries completion
/// timing), so it yields `None` and can never be satisfied.
pub fn counter_value(condition: ConditionType, snapshot: &ProgressSnapshot) -> Option<i64> {
    match condition {
        ConditionType::ItemCount => Some(snapshot.total_items_completed),
        ConditionType::SkillCount => Some(snapshot.total_skills_completed),
        ConditionType::StreakDays => Some(snapshot.streak_count as i64),
        ConditionType::PointsTotal => Some(snapshot.total_points),
        ConditionType::SpeedCompletion => None,
    }
}

/// Whether the condition is met. Thresholds are inclusive.
pub fn is_satisfied(definition: &AchievementDefinition, snapshot: &ProgressSnapshot) -> bool {
    counter_value(definition.condition_type, snapshot)
        .map(|value| value >= definition.condition_value)
        .unwrap_or(false)
}

/// Progress towards unlocking as a percentage (0-100).
///
/// Exactly 100 once unlocked, regardless of the current counter.
pub fn unlock_progress(
    definition: &AchievementDefinition,
    snapshot: &ProgressSnapshot,
    unlocked: bool,
) -> f64 {
    if unlocked {
        return 100.0;
    }
    if definition.condition_value <= 0 {
        return 100.0;
    }
    match counter_value(definition.condition_type, snapshot) {
        Some(value) => {
            let percent = (value.max(0) as f64 / definition.condition_value as f64) * 100.0;
            percent.min(100.0)
        }
        None => 0.0,
    }
}

/// Return the definitions whose conditions are newly satisfied.
///
/// Already-unlocked achievements are skipped, so re-evaluating with no new
/// events yields nothing.
pub fn evaluate<'a>(
    catalog: &'a [AchievementDefinition],
    unlocked: &HashSet<String>,
    snapshot: &ProgressSnapshot,
) -> Vec<&'a AchievementDefinition> {
    catalog
        .iter()
        .filter(|definition| !unlocked.contains(&definition.id))
        .filter(|definition| is_satisfied(definition, snapshot))
        .collect()
}

/// Default achievement catalog seed.
pub fn default_achievements() -> Vec<AchievementDefinition> {
    let seed: [(&str, &str, &str, &str, AchievementCategory, ConditionType, i64, i64); 8] = [
        (
            "first_steps",
            "First Steps",
            "Complete your first checklist item",
            "target",
            AchievementCategory::General,
            ConditionType::ItemCount,
            1,
            10,
        ),
        (
            "getting_started",
            "Getting Started",
            "Complete your first skill",
            "trophy",
            AchievementCategory::Skill,
            ConditionType::SkillCount,
            1,
            25,
        ),
        (
            "consistent",
            "Consistent",
            "Maintain a 3-day streak",
            "flame",
            AchievementCategory::Streak,
            ConditionType::StreakDays,
            3,
            50,
        ),
        (
            "on_fire",
            "On Fire",
            "Maintain a 7-day streak",
            "fire",
            AchievementCategory::Streak,
            ConditionType::StreakDays,
            7,
            100,
        ),
        (
            "unstoppable",
            "Unstoppable",
            "Maintain a 30-day streak",
            "zap",
            AchievementCategory::Streak,
            ConditionType::StreakDays,
            30,
            500,
        ),
        (
            "century_club",
            "Century Club",
            "Complete 100 checklist items",
            "hundred-points",
            AchievementCategory::General,
            ConditionType::ItemCount,
            100,
            200,
        ),
        (
            "skill_master",
            "Skill Master",
            "Complete 10 skills",
            "graduation-cap",
            AchievementCategory::Skill,
            ConditionType::SkillCount,
            10,
            300,
        ),
        (
            "point_hunter",
            "Point Hunter",
            "Earn 1000 total points",
            "star",
            AchievementCategory::General,
            ConditionType::PointsTotal,
            1000,
            100,
        ),
    ];

    seed.into_iter()
        .map(
            |(id, name, description, icon, category, condition_type, condition_value, points_reward)| {
                AchievementDefinition {
                    id: id.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                    icon: icon.to_string(),
                    category,
                    condition_type,
                    condition_value,
                    points_reward,
                    hidden: false,
                }
            },
        )
        .collect()
}
