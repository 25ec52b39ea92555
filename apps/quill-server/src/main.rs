//! # Quill API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use quill_infra::InMemoryRateLimiter;

mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use middleware::rate_limit::RateLimitMiddleware;
use observability::RequestIdMiddleware;
use state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init_telemetry(&config.telemetry);

    tracing::info!(
        service = %config.telemetry.service_name,
        "Starting Quill API Server on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::new(&config).await?;
    let limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()));
    let payload_limit = config.media_max_bytes;

    HttpServer::new(move || {
        App::new()
            .wrap(RateLimitMiddleware::new(limiter.clone()))
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(web::Data::new(state.clone()))
            .app_data(web::PayloadConfig::new(payload_limit))
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
