//! Rate limiting port, used to throttle write endpoints.

use async_trait::async_trait;
use std::time::Duration;

/// Rate limiter trait - abstraction over rate limiting backends.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one request for `key` (usually the client address) and report
    /// whether it may proceed.
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError>;
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the next request would be accepted.
    pub reset_after: Duration,
}

impl RateLimitResult {
    pub fn allow(remaining: u32, reset_after: Duration) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_after,
        }
    }

    pub fn deny(reset_after: Duration) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_after,
        }
    }
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
