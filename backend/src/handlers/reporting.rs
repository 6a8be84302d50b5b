//! HTTP handlers for reporting and analytics endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use shared::View;

use crate::error::AppResult;
use crate::handlers::billing::StatusFilter;
use crate::middleware::{check_view, CurrentUser};
use crate::services::reporting::{
    BillAuditRow, BillProfitRow, DailyProfit, DailyReport, DailyTradeSummary, ReportingService,
};
use crate::AppState;

/// Outstanding revenue response
#[derive(Debug, Serialize)]
pub struct OutstandingRevenue {
    pub total_outstanding: Decimal,
}

/// Realized profit per business day (Paid bills only)
pub async fn daily_profit(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<DailyProfit>>> {
    check_view(&current_user.0, View::ProfitAnalysis)?;

    let service = ReportingService::new(state.db);
    let report = service.daily_profit().await?;
    Ok(Json(report))
}

/// Paid sales vs ledger purchases per business day
pub async fn daily_sales_and_purchases(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<DailyTradeSummary>>> {
    check_view(&current_user.0, View::ProfitAnalysis)?;

    let service = ReportingService::new(state.db);
    let report = service.daily_sales_and_purchases().await?;
    Ok(Json(report))
}

/// Total revenue outstanding on unpaid bills
pub async fn outstanding_revenue(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<OutstandingRevenue>> {
    check_view(&current_user.0, View::ProfitAnalysis)?;

    let service = ReportingService::new(state.db);
    let total_outstanding = service.outstanding_revenue().await?;
    Ok(Json(OutstandingRevenue { total_outstanding }))
}

/// Per-bill profit table, optionally filtered by payment status
pub async fn profit_per_bill(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<StatusFilter>,
) -> AppResult<Json<Vec<BillProfitRow>>> {
    check_view(&current_user.0, View::ProfitAnalysis)?;

    let service = ReportingService::new(state.db);
    let report = service.profit_per_bill(filter.status).await?;
    Ok(Json(report))
}

/// Who created and last edited each bill
pub async fn bill_audit_log(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<BillAuditRow>>> {
    check_view(&current_user.0, View::AuditLog)?;

    let service = ReportingService::new(state.db);
    let log = service.bill_audit_log().await?;
    Ok(Json(log))
}

/// Downloadable daily report: stock snapshot + prior business day's bills
pub async fn daily_report(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DailyReport>> {
    check_view(&current_user.0, View::DailyReport)?;

    let service = ReportingService::new(state.db);
    let report = service.daily_report(Utc::now()).await?;
    Ok(Json(report))
}
