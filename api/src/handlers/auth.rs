//! Auth handlers
//!
//! Endpoints for registration, login and logout.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::bearer_token;
use crate::error::AppError;
use crate::AppState;

/// Request body for registration and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Response body for registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub message: String,
}

/// Response body for login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Session token for API calls (Authorization: Bearer <token>)
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// POST /auth/register
///
/// Register a new user.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = state
        .auth_service
        .register(&request.username, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id.0,
            message: format!("Welcome to KitchenPlaner, {}! Log in to start planning.", user.name),
            username: user.name,
        }),
    ))
}

/// POST /auth/login
///
/// Open a session. The token is only shown once.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let session = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token: session.token,
        username: session.user.name,
        expires_at: session.expires_at,
    }))
}

/// POST /auth/logout
///
/// End the session of the presented bearer token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    state.auth_service.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}
