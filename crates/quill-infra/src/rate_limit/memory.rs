//! In-memory rate limiter using governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota};

use quill_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

/// Keys tracked before stale entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Per-key rate limiter using the GCRA algorithm.
///
/// Limits are per-process, not shared between instances.
pub struct InMemoryRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
    config: RateLimitConfig,
}

impl InMemoryRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: DefaultKeyedRateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            config,
        }
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<RateLimitResult, RateLimitError> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        match self.limiter.check_key(&key.to_string()) {
            // governor does not expose the remaining burst, report the ceiling
            Ok(()) => Ok(RateLimitResult::allow(
                self.config.max_requests,
                self.config.window,
            )),
            Err(not_until) => Ok(RateLimitResult::deny(
                not_until.wait_time_from(self.clock.now()),
            )),
        }
    }
}
