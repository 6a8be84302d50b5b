//! Business logic services for the Stockbook backend

pub mod auth;
pub mod billing;
pub mod inventory;
pub mod reporting;

pub use auth::AuthService;
pub use billing::BillingService;
pub use inventory::InventoryService;
pub use reporting::ReportingService;
