//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthService, LoginResponse, StepUpGrant};
use crate::AppState;

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Step-up request body
#[derive(Debug, Deserialize)]
pub struct StepUpRequest {
    pub passphrase: String,
}

/// Password change request body
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

/// Authenticate and receive an access token
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(&input.username, &input.password).await?;
    Ok(Json(response))
}

/// Record sign-out activity
pub async fn logout(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<()>> {
    let service = AuthService::new(state.db, &state.config);
    service.touch_last_seen(&current_user.0.username).await?;
    Ok(Json(()))
}

/// Exchange the shared passphrase for a short-lived step-up token
pub async fn step_up(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<StepUpRequest>,
) -> AppResult<Json<StepUpGrant>> {
    let service = AuthService::new(state.db, &state.config);
    let grant = service.step_up(&current_user.0.username, &input.passphrase)?;
    Ok(Json(grant))
}

/// Change the calling user's own password
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<Json<()>> {
    let service = AuthService::new(state.db, &state.config);
    service
        .change_password(&current_user.0.username, &input.new_password)
        .await?;
    Ok(Json(()))
}
