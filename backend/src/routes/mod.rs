//! Route definitions for the Stockbook API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth routes (login public, the rest protected)
        .nest("/auth", auth_routes())
        // Protected routes - inventory ledger
        .nest("/items", item_routes())
        // Protected routes - billing
        .nest("/bills", bill_routes())
        // Protected routes - reporting and analytics
        .nest("/reports", report_routes())
        // Protected routes - user administration
        .nest("/users", user_routes())
        // Protected routes - audit log
        .nest("/audit", audit_routes())
        // Protected routes - settings
        .nest("/admin", admin_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/step-up", post(handlers::step_up))
        .route("/password", put(handlers::change_password))
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
}

/// Inventory ledger routes (protected)
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/history", get(handlers::inventory_history))
        .route(
            "/:item_id",
            get(handlers::get_item).put(handlers::update_item),
        )
        .route("/:item_id/adjust", post(handlers::adjust_quantity))
        .route("/:item_id/history", get(handlers::item_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Billing routes (protected)
fn bill_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_bills).post(handlers::create_bill))
        .route(
            "/:bill_id",
            get(handlers::get_bill)
                .put(handlers::edit_bill)
                .delete(handlers::delete_bill),
        )
        .route("/:bill_id/available", get(handlers::available_for_edit))
        .route("/:bill_id/pay", post(handlers::mark_paid))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected; most require a step-up grant)
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/daily-profit", get(handlers::daily_profit))
        .route(
            "/sales-vs-purchases",
            get(handlers::daily_sales_and_purchases),
        )
        .route("/outstanding", get(handlers::outstanding_revenue))
        .route("/profit-per-bill", get(handlers::profit_per_bill))
        .route("/daily-report", get(handlers::daily_report))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// User administration routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:username",
            put(handlers::update_user).delete(handlers::delete_user),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Audit log routes (protected)
fn audit_routes() -> Router<AppState> {
    Router::new()
        .route("/bills", get(handlers::bill_audit_log))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Settings routes (protected)
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/reset-bills", post(handlers::reset_bills))
        .route("/purge", delete(handlers::purge_all_data))
        .route_layer(middleware::from_fn(auth_middleware))
}
