//! Comment create/update/delete flows.

use std::sync::Arc;

use validator::Validate;

use crate::domain::{Actor, Comment, CommentId, NewComment, Post, PostId};
use crate::error::{DomainError, RepoError};
use crate::ports::TransactionalStore;

use super::guard::{require_account, require_actor, require_owner};
use super::posts::CommentInput;

impl CommentInput {
    /// Non-blank content, trimmed.
    pub fn validated(self) -> Result<String, DomainError> {
        self.validate()?;
        Ok(self.content.trim().to_string())
    }
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn TransactionalStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
        Self { store }
    }

    /// The post a comment form belongs to, for callers that only navigate
    /// (no write). Still requires an identity.
    pub async fn target_post(
        &self,
        actor: Option<&Actor>,
        post_id: PostId,
    ) -> Result<Post, DomainError> {
        require_actor(actor)?;
        self.find_post(post_id).await
    }

    /// Add a comment by `actor` to the post.
    ///
    /// Post and author are stamped on the value that is inserted, so a
    /// rejected submission never leaves a half-built record behind.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        post_id: PostId,
        input: CommentInput,
    ) -> Result<Comment, DomainError> {
        require_actor(actor)?;

        let tx = self.store.begin().await?;
        let actor = require_account(&*tx, actor).await?;
        let post = tx
            .find_post(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;
        let content = input.validated()?;

        // The author was checked above, so a failed reference is the post.
        let comment = tx
            .insert_comment(NewComment::new(post.id, actor.user_id, content))
            .await
            .map_err(|err| match err {
                RepoError::Constraint(_) => DomainError::not_found("post", post_id),
                other => other.into(),
            })?;
        tx.commit().await?;

        tracing::info!(comment_id = comment.id, post_id = post.id, user_id = %actor.user_id, "Created comment");
        Ok(comment)
    }

    /// The comment to pre-fill an edit form with. Owner only.
    pub async fn edit_form(
        &self,
        actor: Option<&Actor>,
        id: CommentId,
    ) -> Result<Comment, DomainError> {
        require_actor(actor)?;
        let comment = self.find_comment(id).await?;
        require_owner(actor, &comment)?;
        Ok(comment)
    }

    /// Replace the comment's content. Owner only.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: CommentId,
        input: CommentInput,
    ) -> Result<Comment, DomainError> {
        require_actor(actor)?;
        let mut comment = self.find_comment(id).await?;
        let actor = require_owner(actor, &comment)?;

        comment.content = input.validated()?;
        comment.updated_at = chrono::Utc::now();
        let comment = self.store.update_comment(comment).await?;

        tracing::info!(comment_id = comment.id, user_id = %actor.user_id, "Updated comment");
        Ok(comment)
    }

    /// Delete the comment and return it so the caller can go back to its post.
    /// Owner only.
    pub async fn delete(
        &self,
        actor: Option<&Actor>,
        id: CommentId,
    ) -> Result<Comment, DomainError> {
        require_actor(actor)?;
        let comment = self.find_comment(id).await?;
        let actor = require_owner(actor, &comment)?;

        self.store.delete_comment(id).await?;

        tracing::info!(comment_id = id, user_id = %actor.user_id, "Deleted comment");
        Ok(comment)
    }

    async fn find_post(&self, id: PostId) -> Result<Post, DomainError> {
        self.store
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    async fn find_comment(&self, id: CommentId) -> Result<Comment, DomainError> {
        self.store
            .find_comment(id)
            .await?
            .ok_or_else(|| DomainError::not_found("comment", id))
    }
}
