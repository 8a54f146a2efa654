pub mod achievements;
pub mod checklists;
pub mod levels;
pub mod points;
pub mod stats;
pub mod summary;
