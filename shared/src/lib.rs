//! Shared types and models for the Stockbook inventory & billing system
//!
//! This crate contains the domain models and the pure ledger arithmetic
//! shared between the backend services and the test suites.

pub mod business_day;
pub mod models;
pub mod validation;

pub use business_day::*;
pub use models::*;
pub use validation::*;
