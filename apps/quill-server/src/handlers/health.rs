//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::observability::RequestId;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub backend: &'static str,
    pub timestamp: String,
    pub request_id: String,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>, request_id: RequestId) -> HttpResponse {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend: state.backend,
        timestamp: chrono::Utc::now().to_rfc3339(),
        request_id: request_id.0,
    };

    HttpResponse::Ok().json(response)
}
