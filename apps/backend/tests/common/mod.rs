//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext for setting up the app against a real database
//! - Helper functions for creating and cleaning up test data
//!
//! # Requirements
//! Integration tests require a PostgreSQL database (set DATABASE_URL).

pub mod fixtures;

use axum::Router;

use skillpath_backend::{init_state, AppState};

/// Test context containing the shared state and a ready router.
///
/// Requires DATABASE_URL environment variable to be set.
pub struct TestContext {
    pub state: AppState,
    app: Router,
}

impl TestContext {
    /// Create a new test context.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let state = init_state(&database_url)
            .await
            .expect("Failed to initialize test state");

        let app = skillpath_backend::build_router(state.clone());

        Self { state, app }
    }

    /// Router clone for constructing a TestServer.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    /// Remove all rows created for a test user.
    pub async fn cleanup_user(&self, user_id: &str) {
        let pool = self.state.db.pool();
        for table in ["points_history", "user_achievements", "checklists", "user_stats"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
                .bind(user_id)
                .execute(pool)
                .await
                .expect("cleanup failed");
        }
    }
}
