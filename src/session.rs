use chrono::{DateTime, Utc};
use tracing::info;
use ulid::Ulid;

use crate::model::User;

/// The signed-in user and their API token. Created at app start, consumed
/// by `end` at logout.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Ulid,
    pub user: User,
    token: String,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn start(user: User, token: impl Into<String>) -> Self {
        let session = Self {
            id: Ulid::new(),
            user,
            token: token.into(),
            started_at: Utc::now(),
        };
        info!(session = %session.id, user = %session.user.email, "session started");
        session
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn can_manage_listings(&self) -> bool {
        self.user.role.can_manage_listings()
    }

    pub fn end(self) {
        info!(session = %self.id, user = %self.user.email, "session ended");
    }
}
