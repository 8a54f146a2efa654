//! Error types for progression-core.

use thiserror::Error;

/// Result type alias using LevelTableError.
pub type Result<T> = std::result::Result<T, LevelTableError>;

/// Errors that can occur while validating a level table.
#[derive(Debug, Error)]
pub enum LevelTableError {
    #[error("level table is empty")]
    Empty,

    #[error("first level must require 0 points, got {points_required}")]
    FirstLevelNotZero { points_required: i64 },

    #[error("level numbers must be strictly increasing at level {level}")]
    OutOfOrder { level: i32 },

    #[error("points_required decreases at level {level}")]
    ThresholdRegression { level: i32 },
}
