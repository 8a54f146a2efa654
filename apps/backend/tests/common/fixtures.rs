//! Test fixtures and factory functions for creating test data.

use serde_json::json;
use uuid::Uuid;

/// Unique user id per test run, so parallel tests never collide.
pub fn unique_user_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Create a checklist request body.
pub fn checklist_request(user_id: &str, title: &str, items: &[&str]) -> serde_json::Value {
    json!({
        "user_id": user_id,
        "title": title,
        "goal": "test goal",
        "items": items,
    })
}

/// Create a stats update request body.
pub fn stats_update_request(points: i64, reason: &str) -> serde_json::Value {
    json!({
        "points_to_add": points,
        "reason": reason,
    })
}

/// Create an item status request body.
pub fn item_status_request(completed: bool) -> serde_json::Value {
    json!({ "completed": completed })
}
