//! Auth endpoints: sign up, sign in, sign out, password reset
//!
//! Sessions are bearer tokens. Sign-out has nothing to revoke server side.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{
    hash_password, password_stamp, verify_decoy, verify_password, AuthError, IssuedToken,
    TokenPurpose,
};
use crate::db::repos::{DbError, User, UserRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, PasswordChanger};
use crate::http::server::AppState;
use crate::models::{Email, Password};
use crate::notify::{self, EmailMessage};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            display_name: u.display_name,
            phone: u.phone,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl SessionResponse {
    fn new(issued: IssuedToken, user: User) -> Self {
        Self {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.into(),
        }
    }
}

/// POST /auth/sign-up
async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let email = Email::new(&req.email)?;
    let password = Password::new(&req.password)?;
    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let hash = hash_password(&password)?;
    let user = UserRepo::new(&state.pool)
        .create(&email, &hash, display_name)
        .await?;
    let issued = state.tokens.issue_access(user.id, &user.email)?;

    tracing::info!(user = %user.id, "user signed up");
    Ok((StatusCode::CREATED, Json(SessionResponse::new(issued, user))))
}

/// POST /auth/sign-in
async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = Email::new(&req.email).map_err(|_| AuthError::InvalidCredentials)?;
    let users = UserRepo::new(&state.pool);

    let Some(creds) = users.find_credentials(&email).await? else {
        verify_decoy(&req.password);
        return Err(AuthError::InvalidCredentials.into());
    };
    if !verify_password(&req.password, &creds.password_hash)? {
        tracing::debug!(user = %creds.id, "sign-in rejected");
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = users.get(creds.id).await?;
    let issued = state.tokens.issue_access(user.id, &user.email)?;
    Ok(Json(SessionResponse::new(issued, user)))
}

/// POST /auth/sign-out
async fn sign_out(AuthUser(actor): AuthUser) -> StatusCode {
    tracing::debug!(user = %actor.id, "user signed out");
    StatusCode::NO_CONTENT
}

/// GET /auth/me
async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserRepo::new(&state.pool).get(actor.id).await?;
    Ok(Json(user.into()))
}

/// POST /auth/password-reset - 202 whether or not the account exists
async fn request_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Result<StatusCode, ApiError> {
    let Ok(email) = Email::new(&req.email) else {
        return Ok(StatusCode::ACCEPTED);
    };

    if let Some(creds) = UserRepo::new(&state.pool).find_credentials(&email).await? {
        let stamp = password_stamp(&creds.password_hash)?;
        let issued = state.tokens.issue_reset(creds.id, &creds.email, &stamp)?;
        notify::dispatch(
            Arc::clone(&state.notifier),
            EmailMessage::password_reset(&creds.email, &state.reset_url, &issued.token),
        );
        tracing::info!(user = %creds.id, "password reset requested");
    }

    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/password - set a new password with an access or reset token
///
/// A reset token is spent by the change: it names the hash it may replace.
async fn change_password(
    State(state): State<Arc<AppState>>,
    PasswordChanger(claims): PasswordChanger,
    Json(req): Json<NewPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let password = Password::new(&req.password)?;
    let users = UserRepo::new(&state.pool);

    let current = match claims.purpose {
        TokenPurpose::Access => None,
        TokenPurpose::Reset => {
            let creds = users.get_credentials(claims.sub).await?;
            if claims.stamp.as_deref() != Some(password_stamp(&creds.password_hash)?.as_str()) {
                tracing::debug!(user = %claims.sub, "stale reset token");
                return Err(AuthError::InvalidToken.into());
            }
            Some(creds.password_hash)
        }
    };

    let hash = hash_password(&password)?;
    if !users
        .update_password(claims.sub, &hash, current.as_deref())
        .await?
    {
        return Err(match current {
            Some(_) => AuthError::InvalidToken.into(),
            None => DbError::not_found("user", claims.sub).into(),
        });
    }

    tracing::info!(user = %claims.sub, purpose = ?claims.purpose, "password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/me", get(me))
        .route("/auth/password-reset", post(request_reset))
        .route("/auth/password", post(change_password))
}
