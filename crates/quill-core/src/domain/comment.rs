use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::PostId;
use super::user::UserId;

pub type CommentId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Fragment identifier of this comment on its post's page.
    pub fn anchor(&self) -> String {
        format!("comment-{}", self.id)
    }

    pub fn absolute_url(&self) -> String {
        format!("/posts/{}#{}", self.post_id, self.anchor())
    }
}

/// A comment with its post and author already stamped, ready to persist
/// in a single insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn new(post_id: PostId, author_id: UserId, content: String) -> Self {
        Self {
            post_id,
            author_id,
            content,
            created_at: Utc::now(),
        }
    }
}
