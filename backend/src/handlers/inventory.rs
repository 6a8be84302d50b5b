//! HTTP handlers for inventory management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{can_access, AdjustReason, InventoryItem, InventoryLogEntry, View};

use crate::error::{AppError, AppResult};
use crate::middleware::{check_view, CurrentUser};
use crate::services::inventory::{CreateItemInput, InventoryService, UpdateItemInput};
use crate::AppState;

/// Request body for a bare quantity adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustQuantityRequest {
    pub delta: i64,
    pub reason: AdjustReason,
}

/// List all items.
/// Billers may read the item list too: it feeds the billing screen.
pub async fn list_items(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let user = &current_user.0;
    if !can_access(user.role, View::Inventory) && !can_access(user.role, View::Billing) {
        return Err(AppError::InsufficientPermissions);
    }

    let service = inventory_service(&state);
    let items = service.list_items().await?;
    Ok(Json(items))
}

/// Get a single item
pub async fn get_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let user = &current_user.0;
    if !can_access(user.role, View::Inventory) && !can_access(user.role, View::Billing) {
        return Err(AppError::InsufficientPermissions);
    }

    let service = inventory_service(&state);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Create a new item with its opening stock
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<InventoryItem>> {
    check_view(&current_user.0, View::Inventory)?;

    let service = inventory_service(&state);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// Combined stock and price update
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<InventoryItem>> {
    check_view(&current_user.0, View::Inventory)?;

    let service = inventory_service(&state);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Adjust quantity with a reason code
pub async fn adjust_quantity(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustQuantityRequest>,
) -> AppResult<Json<InventoryItem>> {
    check_view(&current_user.0, View::Inventory)?;

    let service = inventory_service(&state);
    let item = service
        .adjust_quantity(item_id, input.delta, input.reason)
        .await?;
    Ok(Json(item))
}

/// Full inventory history, newest first
pub async fn inventory_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryLogEntry>>> {
    check_view(&current_user.0, View::InventoryHistory)?;

    let service = inventory_service(&state);
    let entries = service.history().await?;
    Ok(Json(entries))
}

/// History for a single item, newest first
pub async fn item_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryLogEntry>>> {
    check_view(&current_user.0, View::InventoryHistory)?;

    let service = inventory_service(&state);
    let entries = service.item_history(item_id).await?;
    Ok(Json(entries))
}

fn inventory_service(state: &AppState) -> InventoryService {
    InventoryService::new(state.db.clone(), state.config.ledger.log_stock_resets)
}
