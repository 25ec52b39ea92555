//! Upload and serve post media.

use actix_web::{HttpResponse, http::header, web};

use quill_core::error::DomainError;
use quill_core::ports::MediaKind;
use quill_core::services::guard::require_actor;
use quill_shared::dto::{UploadQuery, UploadResponse};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /media/{kind}?filename=..
///
/// `kind` is `images` or `files`; the raw body is the file content.
pub async fn upload(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    kind: web::Path<String>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let actor = require_actor(actor.as_ref())?;

    let kind = MediaKind::parse(&kind)
        .ok_or_else(|| AppError::NotFound(format!("unknown media kind '{kind}'")))?;
    if query.filename.trim().is_empty() {
        return Err(AppError::BadRequest("filename is required".to_string()));
    }
    if body.is_empty() {
        return Err(DomainError::invalid("file", "The submitted file is empty.").into());
    }

    let stored = state.media.store(kind, &query.filename, &body).await?;
    tracing::info!(path = %stored.path, bytes = body.len(), user_id = %actor.user_id, "Stored upload");

    Ok(HttpResponse::Created().json(UploadResponse {
        url: stored.url(),
        path: stored.path,
    }))
}

/// GET /media/{path}
pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    let bytes = state
        .media
        .load(&path)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("media '{path}' not found")))?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content_type(&path)))
        .body(bytes))
}

fn content_type(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=utf-8",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
