//! Bearer token extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};

use quill_core::domain::Actor;
use quill_core::ports::{AuthError, STAFF_ROLE, TokenClaims};
use quill_shared::ErrorResponse;

use crate::observability::current_request_id;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Use this in handlers to require authentication:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the user has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The identity as the services see it.
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.user_id,
            is_staff: self.has_role(STAFF_ROLE),
        }
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            roles: claims.roles,
        }
    }
}

/// Error type for authentication failures.
#[derive(Debug)]
pub struct AuthenticationError(pub AuthError);

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match &self.0 {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::MissingAuth => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        let error = match &self.0 {
            AuthError::TokenExpired => ErrorResponse::new(401, "Token Expired")
                .with_detail("Your authentication token has expired. Please login again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::new(401, "Invalid Token").with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::new(401, "Authentication Required")
                .with_detail("Please provide a valid Bearer token in the Authorization header."),
            AuthError::InvalidCredentials => ErrorResponse::unauthorized(),
            AuthError::InsufficientPermissions => ErrorResponse::forbidden(),
            AuthError::HashingError(_) => ErrorResponse::internal_error(),
        };
        let error = match current_request_id() {
            Some(id) => error.with_request_id(id),
            None => error,
        };

        actix_web::HttpResponse::build(self.status_code()).json(error)
    }
}

/// Parse and validate the bearer token, `Ok(None)` when no header is sent.
fn bearer_identity(req: &HttpRequest) -> Result<Option<Identity>, AuthenticationError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthenticationError(AuthError::InvalidToken(
            "Server configuration error".to_string(),
        )));
    };

    let auth_str = auth_header.to_str().map_err(|_| {
        AuthenticationError(AuthError::InvalidToken(
            "Invalid authorization header".to_string(),
        ))
    })?;

    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AuthenticationError(AuthError::InvalidToken(
            "Expected Bearer token".to_string(),
        ))
    })?;

    let claims = state
        .tokens
        .validate_token(token)
        .map_err(AuthenticationError)?;
    Ok(Some(Identity::from(claims)))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            bearer_identity(req)
                .and_then(|identity| identity.ok_or(AuthenticationError(AuthError::MissingAuth))),
        )
    }
}

/// Identity when a bearer token is sent, `None` for anonymous callers.
///
/// A token that is sent but malformed or expired is still rejected with 401.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn actor(&self) -> Option<Actor> {
        self.0.as_ref().map(Identity::actor)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(bearer_identity(req).map(OptionalIdentity))
    }
}
