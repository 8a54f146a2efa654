//! Level table lookup.
//!
//! The table is immutable seed data, validated once at construction.
//! Derived level fields on the aggregate are caches; this lookup is the
//! source of truth and is re-run on every read.

use crate::error::{LevelTableError, Result};
use crate::types::{LevelDefinition, LevelInfo};

/// Title reported once the highest defined level is reached.
pub const MAX_LEVEL_TITLE: &str = "Max level reached";

/// Validated, ascending list of level thresholds.
#[derive(Debug, Clone)]
pub struct LevelTable {
    levels: Vec<LevelDefinition>,
}

impl LevelTable {
    /// Build a table from definitions, enforcing ordering invariants:
    /// strictly increasing level numbers, non-decreasing thresholds, and
    /// level 1 starting at 0 points.
    pub fn new(levels: Vec<LevelDefinition>) -> Result<Self> {
        let first = levels.first().ok_or(LevelTableError::Empty)?;
        if first.points_required != 0 {
            return Err(LevelTableError::FirstLevelNotZero {
                points_required: first.points_required,
            });
        }

        for pair in levels.windows(2) {
            if pair[1].level <= pair[0].level {
                return Err(LevelTableError::OutOfOrder { level: pair[1].level });
            }
            if pair[1].points_required < pair[0].points_required {
                return Err(LevelTableError::ThresholdRegression { level: pair[1].level });
            }
        }

        Ok(Self { levels })
    }

    /// All level definitions in ascending order.
    pub fn levels(&self) -> &[LevelDefinition] {
        &self.levels
    }

    /// Derive level info for a point total.
    ///
    /// The current level is the greatest level whose threshold is at or
    /// below `total_points`. Negative totals are treated as zero.
    pub fn lookup(&self, total_points: i64) -> LevelInfo {
        let total = total_points.max(0);

        let current_index = self
            .levels
            .iter()
            .rposition(|l| l.points_required <= total)
            .unwrap_or(0);
        let current = &self.levels[current_index];

        match self.levels.get(current_index + 1) {
            Some(next) => {
                let span = next.points_required - current.points_required;
                let earned = total - current.points_required;
                let percent = if span > 0 {
                    (earned as f64 / span as f64) * 100.0
                } else {
                    0.0
                };
                LevelInfo {
                    level: current.level,
                    progress_percent: percent.min(100.0),
                    points_to_next: next.points_required - total,
                    next_level_title: next.title.clone(),
                }
            }
            None => LevelInfo {
                level: current.level,
                progress_percent: 0.0,
                points_to_next: 0,
                next_level_title: MAX_LEVEL_TITLE.to_string(),
            },
        }
    }
}

/// Default ten-level seed table.
pub fn default_levels() -> Vec<LevelDefinition> {
    let seed: [(i32, i64, &str, &str, &str); 10] = [
        (1, 0, "Newbie", "Getting started!", "#4CAF50"),
        (2, 100, "Beginner", "First milestone", "#2196F3"),
        (3, 250, "Learner", "Making progress", "#FF9800"),
        (4, 500, "Achiever", "Half way there", "#9C27B0"),
        (5, 1000, "Expert", "Skilled performer", "#F44336"),
        (6, 2000, "Master", "Mastery unlocked", "#E91E63"),
        (7, 4000, "Legend", "Legendary status", "#673AB7"),
        (8, 8000, "Champion", "Champion tier", "#3F51B5"),
        (9, 15000, "Grandmaster", "Elite status", "#009688"),
        (10, 30000, "Ultimate", "Ultimate achievement", "#FF5722"),
    ];

    seed.into_iter()
        .map(|(level, points_required, title, reward, color)| LevelDefinition {
            level,
            points_required,
            title: title.to_string(),
            rewards: vec![reward.to_string()],
            color: color.to_string(),
        })
        .collect()
}
