use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// User entity - the author of posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            is_staff: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    /// The identity this user acts with.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            is_staff: self.is_staff,
        }
    }
}

/// The authenticated identity performing a request.
///
/// Passed explicitly into every service call; `None` means anonymous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub is_staff: bool,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            is_staff: false,
        }
    }

    pub fn staff(user_id: UserId) -> Self {
        Self {
            user_id,
            is_staff: true,
        }
    }
}
