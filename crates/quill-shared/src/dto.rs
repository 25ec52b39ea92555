//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::response::FieldErrorResponse;

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Enter a username of 1 to 150 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ---------------------------------------------------------------------------
// Blog content
// ---------------------------------------------------------------------------

/// Author shown next to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: String,
}

/// Sidebar entry: a category and how many posts it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCountResponse {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub post_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarResponse {
    pub categories: Vec<CategoryCountResponse>,
    pub uncategorized_count: u64,
    pub uncategorized_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: String,
}

/// An uploaded file attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentResponse {
    pub path: String,
    pub url: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_text: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentResponse>,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<AuthorResponse>,
    pub category: Option<CategoryResponse>,
    pub tags: Vec<TagResponse>,
}

/// What a post list is filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListHeadingResponse {
    All,
    Uncategorized { label: String },
    Category(CategoryResponse),
    Tag(TagResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostListResponse {
    pub heading: ListHeadingResponse,
    pub posts: Vec<PostResponse>,
    pub sidebar: SidebarResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub author: Option<AuthorResponse>,
    pub anchor: String,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
    pub sidebar: SidebarResponse,
    pub comment_form: CommentForm,
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Post create/edit form. `tags_str` holds names separated by `,` or `;`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub hook_text: Option<String>,
    pub content: String,
    pub head_image: Option<String>,
    pub file_upload: Option<String>,
    pub category: Option<i64>,
    pub tags_str: String,
}

/// A post form page: blank for create, pre-filled for edit, or re-presented
/// with `errors` after a rejected submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    pub form: PostForm,
    pub categories: Vec<CategoryResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentFormResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i64>,
    pub post_id: i64,
    pub form: CommentForm,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorResponse>,
}

/// Category or tag form. The slug is derived from the name when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyForm {
    pub name: String,
    pub slug: Option<String>,
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_fields_default_when_missing() {
        let form: PostForm =
            serde_json::from_str(r#"{ "title": "Hello", "content": "World" }"#).unwrap();

        assert_eq!(form.title, "Hello");
        assert_eq!(form.category, None);
        assert_eq!(form.tags_str, "");
    }

    #[test]
    fn list_heading_is_tagged_by_kind() {
        let heading = serde_json::to_value(ListHeadingResponse::Uncategorized {
            label: "Uncategorized".into(),
        })
        .unwrap();

        assert_eq!(
            heading,
            serde_json::json!({ "kind": "uncategorized", "label": "Uncategorized" })
        );
    }
}
