//! Comment create/update/delete handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{CommentId, PostId};
use quill_shared::dto::CommentForm;

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::views;

/// GET /posts/{id}/comments
///
/// Nothing to show on its own; sends the caller back to the post.
pub async fn back_to_post(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let post = state
        .comments
        .target_post(actor.as_ref(), post_id.into_inner())
        .await?;
    Ok(views::see_other(post.absolute_url()))
}

/// POST /posts/{id}/comments
pub async fn create(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    post_id: web::Path<PostId>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let post_id = post_id.into_inner();
    let form = body.into_inner();
    let page = views::comment_form(None, post_id, &form.content);

    let comment = state
        .comments
        .create(actor.as_ref(), post_id, views::comment_input(form))
        .await
        .map_err(|e| AppError::from(e).with_form(&page))?;

    Ok(views::see_other(comment.absolute_url()))
}

/// GET /comments/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<CommentId>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let comment = state
        .comments
        .edit_form(actor.as_ref(), id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::comment_form(
        Some(comment.id),
        comment.post_id,
        &comment.content,
    )))
}

/// POST /comments/{id}/edit
pub async fn update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<CommentId>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let id = id.into_inner();
    let form = body.into_inner();

    let current = state.comments.edit_form(actor.as_ref(), id).await?;
    let page = views::comment_form(Some(id), current.post_id, &form.content);

    let comment = state
        .comments
        .update(actor.as_ref(), id, views::comment_input(form))
        .await
        .map_err(|e| AppError::from(e).with_form(&page))?;

    Ok(views::see_other(comment.absolute_url()))
}

/// POST /comments/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<CommentId>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let comment = state
        .comments
        .delete(actor.as_ref(), id.into_inner())
        .await?;
    Ok(views::see_other(format!("/posts/{}", comment.post_id)))
}
