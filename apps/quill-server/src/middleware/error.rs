//! Error handling middleware - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

use quill_core::error::{DomainError, FieldErrors, RepoError};
use quill_core::ports::MediaError;
use quill_shared::{ErrorResponse, FieldErrorResponse};

use crate::observability::current_request_id;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Forbidden,
    Conflict(String),
    Internal(String),
    /// A rejected form; `form` carries the submitted values back.
    Validation {
        errors: Vec<FieldErrorResponse>,
        form: Option<serde_json::Value>,
    },
}

impl AppError {
    /// Attach the page to re-present when this is a validation failure.
    pub fn with_form<F: Serialize>(self, form: &F) -> Self {
        match self {
            AppError::Validation { errors, .. } => match serde_json::to_value(form) {
                Ok(value) => AppError::Validation {
                    errors,
                    form: Some(value),
                },
                Err(e) => AppError::Internal(format!("failed to encode form: {e}")),
            },
            other => other,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::Forbidden => write!(f, "Forbidden"),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation { errors, .. } => {
                write!(f, "Validation errors: {} field(s)", errors.len())
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::Forbidden => ErrorResponse::forbidden(),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation { errors, form } => match form {
                Some(form) => {
                    ErrorResponse::validation_failed().with_form(errors.clone(), form.clone())
                }
                None => {
                    let mut error = ErrorResponse::validation_failed();
                    error.errors = errors.clone();
                    error
                }
            },
        };
        let error = match current_request_id() {
            Some(id) => error.with_request_id(id),
            None => error,
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

pub fn field_errors(errors: &FieldErrors) -> Vec<FieldErrorResponse> {
    errors
        .iter()
        .map(|e| FieldErrorResponse {
            field: e.field.clone(),
            message: e.message.clone(),
        })
        .collect()
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} '{}' not found", entity_type, key))
            }
            DomainError::Validation(errors) => AppError::Validation {
                errors: field_errors(&errors),
                form: None,
            },
            DomainError::Conflict(msg) => AppError::Conflict(msg),
            DomainError::Forbidden => AppError::Forbidden,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidPath(path) => {
                AppError::NotFound(format!("media '{path}' not found"))
            }
            MediaError::Io(msg) => AppError::Internal(format!("media storage: {msg}")),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
