//! JWT token service implementation.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::ports::{AuthError, TokenClaims, TokenService};

pub const DEFAULT_SECRET: &str = "change-me-in-production";
pub const DEFAULT_ISSUER: &str = "quill";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

/// Internal JWT claims structure for serialization.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user_id
    username: String,
    roles: Vec<String>,
    exp: i64,
    iat: i64,
    iss: String,
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        if config.secret == DEFAULT_SECRET {
            tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
        }

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(
        &self,
        user_id: Uuid,
        username: &str,
        roles: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            roles,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;
        let claims = data.claims;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(TokenClaims {
            user_id,
            username: claims.username,
            roles: claims.roles,
            exp: claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ports::{STAFF_ROLE, USER_ROLE};

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        }
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(
                user_id,
                "alice",
                vec![USER_ROLE.to_string(), STAFF_ROLE.to_string()],
            )
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.roles, vec!["user".to_string(), "staff".to_string()]);
    }

    #[test]
    fn garbage_token_is_invalid() {
        let service = JwtTokenService::new(test_config());

        let result = service.validate_token("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn token_from_another_issuer_is_rejected() {
        let issuer = JwtTokenService::new(JwtConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        });
        let service = JwtTokenService::new(test_config());

        let token = issuer
            .generate_token(Uuid::new_v4(), "mallory", vec![])
            .unwrap();

        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: -2,
            ..test_config()
        });

        let token = service
            .generate_token(Uuid::new_v4(), "bob", vec![])
            .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn expiration_is_reported_in_seconds() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: 24,
            ..test_config()
        });

        assert_eq!(service.expiration_seconds(), 86400);
    }
}
