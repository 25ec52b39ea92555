//! Category and tag handlers.

use actix_web::{HttpResponse, http::header, web};

use quill_core::services::TaxonomyInput;
use quill_shared::dto::{TagResponse, TaxonomyForm};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::views;

fn taxonomy_input(form: TaxonomyForm) -> TaxonomyInput {
    TaxonomyInput {
        name: form.name,
        slug: form.slug,
    }
}

/// GET /categories
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let sidebar = state.taxonomy.categories().await?;
    Ok(HttpResponse::Ok().json(views::sidebar(&sidebar)))
}

/// POST /categories
pub async fn create_category(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: web::Json<TaxonomyForm>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let form = body.into_inner();

    let category = state
        .taxonomy
        .create_category(actor.as_ref(), taxonomy_input(form.clone()))
        .await
        .map_err(|e| AppError::from(e).with_form(&form))?;

    let body = views::category(&category);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, body.url.clone()))
        .json(body))
}

/// POST /categories/{slug}/delete
pub async fn delete_category(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    state.taxonomy.delete_category(actor.as_ref(), &slug).await?;
    Ok(views::see_other("/categories"))
}

/// GET /tags
pub async fn list_tags(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let tags = state.taxonomy.tags().await?;
    let body: Vec<TagResponse> = tags.iter().map(views::tag).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /tags
pub async fn create_tag(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    body: web::Json<TaxonomyForm>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let form = body.into_inner();

    let tag = state
        .taxonomy
        .create_tag(actor.as_ref(), taxonomy_input(form.clone()))
        .await
        .map_err(|e| AppError::from(e).with_form(&form))?;

    let body = views::tag(&tag);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, body.url.clone()))
        .json(body))
}
