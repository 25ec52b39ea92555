//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`:
//! storage, authentication, uploads and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory store only
//! - `postgres` - PostgreSQL store via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Rate limiting via governor

pub mod media;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

pub use media::LocalMediaStorage;
pub use memory::InMemoryStore;

#[cfg(feature = "postgres")]
pub use database::{DatabaseConfig, PostgresStore};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
