//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use quill_infra::auth::{DEFAULT_ISSUER, DEFAULT_SECRET};
#[cfg(feature = "postgres")]
use quill_infra::database::DatabaseConfig;
use quill_infra::{JwtConfig, RateLimitConfig};

use crate::telemetry::TelemetryConfig;

/// Default upload size cap: 10 MiB.
const DEFAULT_MEDIA_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the in-memory store.
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    pub media_root: PathBuf,
    pub media_max_bytes: usize,
    /// Emails that register as staff, lower-cased.
    pub staff_emails: Vec<String>,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        #[cfg(feature = "postgres")]
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", 100),
            min_connections: parse_or("DB_MIN_CONNECTIONS", 10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            #[cfg(feature = "postgres")]
            database,
            media_root: env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./media")),
            media_max_bytes: parse_or("MEDIA_MAX_BYTES", DEFAULT_MEDIA_MAX_BYTES),
            staff_emails: parse_list(&env::var("STAFF_EMAILS").unwrap_or_default()),
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string()),
                expiration_hours: parse_or("JWT_EXPIRATION_HOURS", 24),
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string()),
            },
            rate_limit: RateLimitConfig {
                max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", 100),
                window: Duration::from_secs(parse_or("RATE_LIMIT_WINDOW_SECS", 60)),
            },
            telemetry: TelemetryConfig::from_env(),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Comma separated values, trimmed and lower-cased, blanks dropped.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_list;

    #[test]
    fn staff_list_is_normalized() {
        assert_eq!(
            parse_list(" Admin@Example.com, ,editor@example.com "),
            vec!["admin@example.com", "editor@example.com"]
        );
        assert!(parse_list("").is_empty());
    }
}
