//! Account handlers.

use actix_web::{HttpResponse, web};
use validator::Validate;

use quill_core::domain::User;
use quill_core::error::DomainError;
use quill_core::ports::{STAFF_ROLE, USER_ROLE};
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::views;

fn roles_for(user: &User) -> Vec<String> {
    let mut roles = vec![USER_ROLE.to_string()];
    if user.is_staff {
        roles.push(STAFF_ROLE.to_string());
    }
    roles
}

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, roles_for(user))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

fn validate_registration(req: &RegisterUserRequest) -> Result<(), AppError> {
    req.validate()
        .map_err(|errors| DomainError::from(errors).into())
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let mut req = body.into_inner();
    req.username = req.username.trim().to_string();
    req.email = req.email.trim().to_lowercase();
    validate_registration(&req)?;

    if state.store.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if state.store.find_by_username(&req.username).await?.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let is_staff = state.is_staff_email(&req.email);
    let user = User::new(req.username, req.email, password_hash).with_staff(is_staff);
    let user = state.store.insert_user(user).await?;

    tracing::info!(user_id = %user.id, is_staff, "Registered user");
    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .store
        .find_by_email(&req.email.trim().to_lowercase())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .store
        .find_user(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("account no longer exists".to_string()))?;

    Ok(HttpResponse::Ok().json(views::user(&user)))
}

/// DELETE /api/auth/me
///
/// Posts stay with their author cleared; comments go with the account.
pub async fn delete_me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.store.delete_user(identity.user_id).await?;
    tracing::info!(user_id = %identity.user_id, username = %identity.username, "Deleted account");
    Ok(HttpResponse::NoContent().finish())
}
