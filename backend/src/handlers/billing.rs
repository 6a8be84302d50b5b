//! HTTP handlers for billing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Bill, PaymentStatus, View};

use crate::error::AppResult;
use crate::middleware::{check_view, CurrentUser};
use crate::services::billing::{AvailableItem, BillInput, BillingService};
use crate::AppState;

/// Optional payment-status filter for bill listings
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<PaymentStatus>,
}

/// Create a bill, reserving stock for each line
pub async fn create_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BillInput>,
) -> AppResult<Json<Bill>> {
    check_view(&current_user.0, View::Billing)?;

    let service = BillingService::new(state.db);
    let bill = service.create_bill(input, &current_user.0.username).await?;
    Ok(Json(bill))
}

/// List bills, newest first
pub async fn list_bills(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<StatusFilter>,
) -> AppResult<Json<Vec<Bill>>> {
    check_view(&current_user.0, View::ViewBills)?;

    let service = BillingService::new(state.db);
    let bills = service.list_bills(filter.status).await?;
    Ok(Json(bills))
}

/// Get a single bill
pub async fn get_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<Bill>> {
    check_view(&current_user.0, View::ViewBills)?;

    let service = BillingService::new(state.db);
    let bill = service.get_bill(bill_id).await?;
    Ok(Json(bill))
}

/// Overwrite a bill, re-reserving stock for the net difference
pub async fn edit_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
    Json(input): Json<BillInput>,
) -> AppResult<Json<Bill>> {
    check_view(&current_user.0, View::Billing)?;

    let service = BillingService::new(state.db);
    let bill = service
        .edit_bill(bill_id, input, &current_user.0.username)
        .await?;
    Ok(Json(bill))
}

/// Item availability as seen by the editor of this bill
pub async fn available_for_edit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<Vec<AvailableItem>>> {
    check_view(&current_user.0, View::Billing)?;

    let service = BillingService::new(state.db);
    let items = service.available_for_edit(bill_id).await?;
    Ok(Json(items))
}

/// Delete a bill, releasing its stock
pub async fn delete_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    check_view(&current_user.0, View::ViewBills)?;

    let service = BillingService::new(state.db);
    service.delete_bill(bill_id).await?;
    Ok(Json(()))
}

/// Mark a bill as paid
pub async fn mark_paid(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(bill_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    check_view(&current_user.0, View::ViewBills)?;

    let service = BillingService::new(state.db);
    service.mark_paid(bill_id).await?;
    Ok(Json(()))
}
