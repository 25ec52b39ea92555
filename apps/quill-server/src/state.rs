//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{MediaStorage, PasswordService, TokenService, TransactionalStore};
use quill_core::services::{CommentService, PostService, TaxonomyService};
use quill_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService, LocalMediaStorage};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TransactionalStore>,
    pub posts: PostService,
    pub comments: CommentService,
    pub taxonomy: TaxonomyService,
    pub media: Arc<dyn MediaStorage>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub staff_emails: Arc<[String]>,
    /// Name of the storage backend, reported by the health check.
    pub backend: &'static str,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let (store, backend) = build_store(config).await?;

        let state = Self::with_parts(
            store,
            backend,
            Arc::new(LocalMediaStorage::new(&config.media_root)),
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            Arc::new(Argon2PasswordService::new()),
            config.staff_emails.clone(),
        );

        tracing::info!(
            backend,
            media_root = %config.media_root.display(),
            "Application state initialized"
        );
        Ok(state)
    }

    pub fn with_parts(
        store: Arc<dyn TransactionalStore>,
        backend: &'static str,
        media: Arc<dyn MediaStorage>,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
        staff_emails: Vec<String>,
    ) -> Self {
        Self {
            posts: PostService::new(store.clone()),
            comments: CommentService::new(store.clone()),
            taxonomy: TaxonomyService::new(store.clone()),
            store,
            media,
            tokens,
            passwords,
            staff_emails: staff_emails.into(),
            backend,
        }
    }

    /// Whether an account registering with `email` becomes staff.
    pub fn is_staff_email(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.staff_emails.iter().any(|e| *e == email)
    }
}

#[cfg(feature = "postgres")]
async fn build_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn TransactionalStore>, &'static str)> {
    use anyhow::Context;
    use quill_infra::PostgresStore;

    match &config.database {
        Some(db) => {
            let conn = quill_infra::database::connect(db)
                .await
                .context("failed to connect to database")?;
            Ok((Arc::new(PostgresStore::new(conn)), "postgres"))
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
            Ok((Arc::new(InMemoryStore::new()), "memory"))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn build_store(
    _config: &AppConfig,
) -> anyhow::Result<(Arc<dyn TransactionalStore>, &'static str)> {
    if std::env::var("DATABASE_URL").is_ok() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; ignoring");
    }
    tracing::info!("Running without postgres feature - using the in-memory store");
    Ok((Arc::new(InMemoryStore::new()), "memory"))
}
