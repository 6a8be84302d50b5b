//! HTTP handlers for the Stockbook API

mod admin;
mod auth;
mod billing;
mod inventory;
mod reporting;
mod users;

pub use admin::*;
pub use auth::*;
pub use billing::*;
pub use inventory::*;
pub use reporting::*;
pub use users::*;
