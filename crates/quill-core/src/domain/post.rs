use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::category::CategoryId;
use super::user::UserId;

pub type PostId = i64;

pub const TITLE_MAX: usize = 30;
pub const HOOK_TEXT_MAX: usize = 100;

/// Post entity - represents a blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub hook_text: Option<String>,
    pub content: String,
    pub head_image: Option<String>,
    pub file_upload: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: Option<UserId>,
    pub category_id: Option<CategoryId>,
}

impl Post {
    pub fn absolute_url(&self) -> String {
        format!("/posts/{}", self.id)
    }

    /// Last path component of the attached file.
    pub fn file_name(&self) -> Option<&str> {
        self.file_upload
            .as_deref()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }

    /// Extension of the attached file, without the dot.
    pub fn file_ext(&self) -> Option<&str> {
        self.file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Overwrite the editable fields from a validated draft.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.hook_text = draft.hook_text;
        self.content = draft.content;
        self.head_image = draft.head_image;
        self.file_upload = draft.file_upload;
        self.category_id = draft.category_id;
        self.updated_at = Utc::now();
    }
}

/// The user-editable fields of a post. Category existence is checked
/// against storage by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PostDraft {
    #[validate(custom(function = "crate::validation::validate_required"))]
    #[validate(length(
        max = 30,
        message = "Ensure this value has at most 30 characters."
    ))]
    pub title: String,
    #[validate(length(
        max = 100,
        message = "Ensure this value has at most 100 characters."
    ))]
    pub hook_text: Option<String>,
    #[validate(custom(function = "crate::validation::validate_required"))]
    pub content: String,
    pub head_image: Option<String>,
    pub file_upload: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl PostDraft {
    /// Trim text fields and drop blank optional values.
    pub fn normalized(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            title: self.title.trim().to_string(),
            hook_text: optional(self.hook_text),
            content: self.content,
            head_image: optional(self.head_image),
            file_upload: optional(self.file_upload),
            category_id: self.category_id,
        }
    }
}

/// A post about to be inserted; storage assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub draft: PostDraft,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new(draft: PostDraft, author_id: UserId) -> Self {
        Self {
            draft,
            author_id,
            created_at: Utc::now(),
        }
    }
}
