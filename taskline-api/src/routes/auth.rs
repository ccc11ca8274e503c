/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a new account (role VIEWER)
/// - `POST /api/auth/login` - Exchange credentials for a token pair
/// - `POST /api/auth/refresh` - Rotate a refresh token
/// - `POST /api/auth/logout` - Drop the caller's refresh token
///
/// All four are public routes. Credential and token failures are 400s;
/// a login attempt against an unknown email is a 404.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use taskline_shared::auth::service::TokenPair;

use crate::{app::AppState, error::ApiResult};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh / logout request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// Refresh token
    pub refresh_token: String,
}

/// Token pair response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Access token (15 minutes)
    pub access_token: String,

    /// Refresh token (7 days)
    pub refresh_token: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

/// Registers a new account and returns a first token pair.
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or email already in use
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let pair = state
        .auth
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok(Json(pair.into()))
}

/// Authenticates and returns a fresh token pair.
///
/// # Errors
///
/// - `400 Bad Request`: wrong password
/// - `404 Not Found`: no account with that email
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let pair = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(pair.into()))
}

/// Rotates a refresh token into a new token pair.
///
/// The presented token becomes permanently unusable whether or not the
/// exchange succeeds past the registry check.
///
/// # Errors
///
/// - `400 Bad Request`: token invalid, expired, of the wrong kind, or
///   superseded by a newer login/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let pair = state.auth.refresh(&req.refresh_token).await?;

    Ok(Json(pair.into()))
}

/// Terminates the session named by the refresh token.
///
/// Always succeeds: logging out with a garbage, expired, or already
/// cleared token is a no-op.
pub async fn logout(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.auth.logout(&req.refresh_token).await;

    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}
