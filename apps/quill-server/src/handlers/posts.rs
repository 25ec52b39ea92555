//! Post list, detail and create/update/delete handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::PostId;
use quill_core::error::DomainError;
use quill_core::services::PostFilter;
use quill_shared::dto::PostForm;

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::views;

/// GET /posts
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let listing = state.posts.list(&PostFilter::All).await?;
    Ok(HttpResponse::Ok().json(views::listing(&listing)))
}

/// GET /posts/category/{slug}
pub async fn list_by_category(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let listing = state.posts.list(&PostFilter::category(&slug)).await?;
    Ok(HttpResponse::Ok().json(views::listing(&listing)))
}

/// GET /posts/tag/{slug}
pub async fn list_by_tag(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let listing = state.posts.list(&PostFilter::tag(&slug)).await?;
    Ok(HttpResponse::Ok().json(views::listing(&listing)))
}

/// GET /posts/{id}
pub async fn detail(state: web::Data<AppState>, id: web::Path<PostId>) -> AppResult<HttpResponse> {
    let detail = state.posts.detail(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(views::detail(&detail)))
}

/// GET /posts/new
pub async fn new_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let page = state.posts.new_form(actor.as_ref()).await?;
    Ok(HttpResponse::Ok().json(views::post_form_page(&page)))
}

/// POST /posts/new
pub async fn create(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let form = body.into_inner();

    match state
        .posts
        .create(actor.as_ref(), views::post_input(form.clone()))
        .await
    {
        Ok(saved) => Ok(views::see_other(saved.post.absolute_url())),
        Err(err) => Err(reject_post_form(&state, None, form, err).await),
    }
}

/// GET /posts/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let page = state
        .posts
        .edit_form(actor.as_ref(), id.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(views::post_form_page(&page)))
}

/// POST /posts/{id}/edit
pub async fn update(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<PostId>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let id = id.into_inner();
    let form = body.into_inner();

    match state
        .posts
        .update(actor.as_ref(), id, views::post_input(form.clone()))
        .await
    {
        Ok(saved) => Ok(views::see_other(saved.post.absolute_url())),
        Err(err) => Err(reject_post_form(&state, Some(id), form, err).await),
    }
}

/// POST /posts/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    id: web::Path<PostId>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    state.posts.delete(actor.as_ref(), id.into_inner()).await?;
    Ok(views::see_other("/posts"))
}

/// Re-present the submitted form with its category choices on a
/// validation failure; other errors pass through.
async fn reject_post_form(
    state: &AppState,
    post_id: Option<PostId>,
    form: PostForm,
    err: DomainError,
) -> AppError {
    let err = AppError::from(err);
    if !matches!(err, AppError::Validation { .. }) {
        return err;
    }

    let categories = match state.posts.categories().await {
        Ok(categories) => categories,
        Err(e) => return AppError::from(e),
    };
    err.with_form(&views::rejected_post_form(post_id, form, &categories))
}
