//! Access token helpers for integration tests.

use chrono::Duration;
use tubely_api::auth::issue_token;
use uuid::Uuid;

use super::TEST_JWT_SECRET;

pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn new() -> Self {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, TEST_JWT_SECRET, Duration::hours(1)).unwrap();
        Self { user_id, token }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
