/// Authentication endpoints
///
/// - `POST /v1/auth/register`: create an account and sign in
/// - `POST /v1/auth/login`: exchange email and password for tokens
/// - `POST /v1/auth/refresh`: exchange a refresh token for a new access token
/// - `GET  /v1/auth/me`: profile of the signed-in user

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasknest_shared::{
    auth::{jwt, middleware::AuthContext, password},
    models::{
        task::Task,
        user::{CreateUser, User},
    },
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked against the strength rules after field validation
    pub password: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Tokens issued on register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: Uuid,

    /// Access token (1h)
    pub access_token: String,

    /// Refresh token (30d)
    pub refresh_token: String,

    /// Always `Bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (1h)
    pub access_token: String,

    pub expires_in: i64,
}

/// Current user profile
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub task_count: i64,
}

fn issue_tokens(user_id: Uuid, secret: &str) -> ApiResult<TokenResponse> {
    let access_claims = jwt::Claims::new(user_id, jwt::TokenType::Access);
    let refresh_claims = jwt::Claims::new(user_id, jwt::TokenType::Refresh);

    Ok(TokenResponse {
        user_id,
        access_token: jwt::create_token(&access_claims, secret)?,
        refresh_token: jwt::create_token(&refresh_claims, secret)?,
        token_type: "Bearer".to_string(),
        expires_in: jwt::TokenType::Access.default_expiration().num_seconds(),
    })
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
///
/// { "email": "user@example.com", "password": "SecureP@ss123", "name": "Jo" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: invalid email or weak password
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email.trim().to_string(),
            password_hash,
            name: req.name.filter(|n| !n.trim().is_empty()),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(issue_tokens(user.id, state.jwt_secret())?))
}

/// Sign in with email and password
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    User::update_last_login(&state.db, user.id).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(issue_tokens(user.id, state.jwt_secret())?))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        expires_in: jwt::TokenType::Access.default_expiration().num_seconds(),
    }))
}

/// Profile of the token's user
///
/// A token for a deleted account gets 401 rather than 404.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<MeResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("No user found".to_string()))?;

    let task_count = Task::count_by_user(&state.db, user.id).await?;

    Ok(Json(MeResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        created_at: user.created_at,
        last_login_at: user.last_login_at,
        task_count,
    }))
}
