//! HTTP handlers for the settings endpoints: bulk reset and full purge

use axum::{extract::State, Json};
use serde::Deserialize;

use shared::View;

use crate::error::{AppError, AppResult};
use crate::middleware::{check_view, CurrentUser};
use crate::services::inventory::{InventoryService, ResetSummary};
use crate::AppState;

/// Confirmation phrase required to reset all bills
const RESET_CONFIRMATION: &str = "RESET BILLS";

/// Confirmation phrase required to purge all data
const PURGE_CONFIRMATION: &str = "DELETE";

/// Request body carrying the typed confirmation phrase
#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub confirmation: String,
}

/// Delete all bills and restore their reserved stock
pub async fn reset_bills(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ConfirmationRequest>,
) -> AppResult<Json<ResetSummary>> {
    check_view(&current_user.0, View::Settings)?;

    if input.confirmation.trim() != RESET_CONFIRMATION {
        return Err(AppError::validation(
            "confirmation",
            "Confirmation text did not match",
        ));
    }

    let service = InventoryService::new(state.db, state.config.ledger.log_stock_resets);
    let summary = service.reset_all_stock().await?;
    Ok(Json(summary))
}

/// Permanently delete all inventory, bills, and history
pub async fn purge_all_data(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ConfirmationRequest>,
) -> AppResult<Json<()>> {
    check_view(&current_user.0, View::Settings)?;

    if input.confirmation.trim() != PURGE_CONFIRMATION {
        return Err(AppError::validation(
            "confirmation",
            "Confirmation text did not match",
        ));
    }

    let service = InventoryService::new(state.db, state.config.ledger.log_stock_resets);
    service.purge_all_data().await?;
    Ok(Json(()))
}
