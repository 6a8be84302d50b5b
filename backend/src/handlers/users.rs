//! HTTP handlers for user administration endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use shared::{User, View};

use crate::error::AppResult;
use crate::middleware::{check_view, CurrentUser};
use crate::services::auth::{AuthService, CreateUserInput, UpdateUserInput};
use crate::AppState;

/// List users with derived Online/Offline status
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    check_view(&current_user.0, View::UserAdmin)?;

    let service = AuthService::new(state.db, &state.config);
    let users = service.list_users().await?;
    Ok(Json(users))
}

/// Create a user account
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Json<User>> {
    check_view(&current_user.0, View::UserAdmin)?;

    let service = AuthService::new(state.db, &state.config);
    let user = service.create_user(input).await?;
    Ok(Json(user))
}

/// Update a user account
pub async fn update_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(username): Path<String>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<Json<User>> {
    check_view(&current_user.0, View::UserAdmin)?;

    let service = AuthService::new(state.db, &state.config);
    let user = service.update_user(&username, input).await?;
    Ok(Json(user))
}

/// Delete a user account
pub async fn delete_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<()>> {
    check_view(&current_user.0, View::UserAdmin)?;

    let service = AuthService::new(state.db, &state.config);
    service.delete_user(&username).await?;
    Ok(Json(()))
}
