//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, check_view, AuthUser, CurrentUser};
