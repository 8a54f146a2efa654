//! Achievement catalog and unlock API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL before running.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

use common::fixtures;
use common::TestContext;

/// A fresh user sees the full seeded catalog, nothing unlocked.
#[tokio::test]
#[ignore = "requires database"]
async fn test_fresh_user_catalog() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_id = fixtures::unique_user_id("catalog");

    let response = server.get(&format!("/api/achievements/{user_id}")).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 8);
    for entry in list {
        assert_eq!(entry["is_unlocked"], false);
        assert_eq!(entry["progress"].as_f64().unwrap(), 0.0);
        assert!(entry.get("unlocked_at").is_none());
    }

    ctx.cleanup_user(&user_id).await;
}

/// Marking an achievement seen without an unlock record is a 404.
#[tokio::test]
#[ignore = "requires database"]
async fn test_mark_seen_without_unlock() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_id = fixtures::unique_user_id("seen");

    let response = server
        .post(&format!("/api/achievements/{user_id}/first_steps/mark-seen"))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup_user(&user_id).await;
}

/// An item completion unlocks First Steps, which can then be marked seen.
#[tokio::test]
#[ignore = "requires database"]
async fn test_unlock_then_mark_seen() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_id = fixtures::unique_user_id("unlock");

    let outcome: serde_json::Value = server
        .post(&format!(
            "/api/points/{user_id}/add?points=10&reason=item_completed"
        ))
        .await
        .json();
    let unlocked = outcome["newly_unlocked"].as_array().unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0]["id"], "first_steps");
    assert_eq!(unlocked[0]["points_reward"].as_i64().unwrap(), 10);
    // Bonus points land in the response totals
    assert_eq!(outcome["stats"]["total_points"].as_i64().unwrap(), 20);

    let list: serde_json::Value = server
        .get(&format!("/api/achievements/{user_id}"))
        .await
        .json();
    let first_steps = list
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "first_steps")
        .unwrap();
    assert_eq!(first_steps["is_unlocked"], true);
    assert_eq!(first_steps["progress"].as_f64().unwrap(), 100.0);
    assert_eq!(first_steps["seen"], false);

    let response = server
        .post(&format!("/api/achievements/{user_id}/first_steps/mark-seen"))
        .await;
    response.assert_status_ok();

    let list: serde_json::Value = server
        .get(&format!("/api/achievements/{user_id}"))
        .await
        .json();
    let first_steps = list
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "first_steps")
        .unwrap();
    assert_eq!(first_steps["seen"], true);

    ctx.cleanup_user(&user_id).await;
}

/// Re-evaluating with no new progress grants nothing twice.
#[tokio::test]
#[ignore = "requires database"]
async fn test_unlock_is_granted_once() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_id = fixtures::unique_user_id("once");

    let first: serde_json::Value = server
        .post(&format!(
            "/api/points/{user_id}/add?points=10&reason=item_completed"
        ))
        .await
        .json();
    assert_eq!(first["newly_unlocked"].as_array().unwrap().len(), 1);

    // A zero-delta update re-runs evaluation against the same counters
    let second: serde_json::Value = server
        .post(&format!("/api/stats/{user_id}/update"))
        .json(&serde_json::json!({}))
        .await
        .json();
    assert_eq!(second["newly_unlocked"].as_array().unwrap().len(), 0);

    let unlocks = ctx.state.db.get_unlocks(&user_id).await.unwrap();
    assert_eq!(unlocks.len(), 1);

    // The unlock committed together with exactly one bonus ledger entry
    let entries = ctx.state.db.get_recent_points(&user_id, 20).await.unwrap();
    let bonuses: Vec<_> = entries
        .iter()
        .filter(|e| e.reason == "achievement_unlocked")
        .collect();
    assert_eq!(bonuses.len(), 1);
    assert_eq!(bonuses[0].reference_id.as_deref(), Some("first_steps"));
    assert_eq!(bonuses[0].points, 10);

    ctx.cleanup_user(&user_id).await;
}

/// An unlock record pointing at a catalog entry that no longer exists is
/// skipped without failing the listing.
#[tokio::test]
#[ignore = "requires database"]
async fn test_orphan_unlock_does_not_break_listing() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_id = fixtures::unique_user_id("orphan");

    sqlx::query(
        "INSERT INTO user_achievements (id, user_id, achievement_id) VALUES ($1, $2, $3)",
    )
    .bind(uuid::Uuid::new_v4())
    .bind(&user_id)
    .bind("retired_achievement")
    .execute(ctx.state.db.pool())
    .await
    .unwrap();

    let response = server.get(&format!("/api/achievements/{user_id}")).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 8);
    assert!(list.iter().all(|a| a["id"] != "retired_achievement"));

    ctx.cleanup_user(&user_id).await;
}

/// An unlock bonus does not chain into further unlocks within the same
/// event; the next event picks up the new totals.
#[tokio::test]
#[ignore = "requires database"]
async fn test_bonus_points_do_not_chain() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let user_id = fixtures::unique_user_id("chain");

    // 990 points leaves the user 10 short of Point Hunter (1000)
    let outcome: serde_json::Value = server
        .post(&format!(
            "/api/points/{user_id}/add?points=990&reason=streak_bonus"
        ))
        .await
        .json();
    assert_eq!(outcome["newly_unlocked"].as_array().unwrap().len(), 0);

    // The item event's own 10 points cross the bar within this event;
    // its First Steps bonus lands after the snapshot and grants nothing
    // extra here.
    let outcome: serde_json::Value = server
        .post(&format!(
            "/api/points/{user_id}/add?points=10&reason=item_completed"
        ))
        .await
        .json();
    let ids: Vec<&str> = outcome["newly_unlocked"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["first_steps", "point_hunter"]);
    // 990 + 10 + first_steps 10 + point_hunter 100
    assert_eq!(outcome["stats"]["total_points"].as_i64().unwrap(), 1110);

    ctx.cleanup_user(&user_id).await;
}
