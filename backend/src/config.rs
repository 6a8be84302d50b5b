//! Configuration management for the Stockbook backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STOCKBOOK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Authentication configuration
    pub auth: AuthConfig,

    /// Ledger policy configuration
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Secret key for signing JWT tokens
    pub jwt_secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Shared passphrase for step-up access to sensitive views
    pub step_up_passphrase: String,

    /// Step-up grant expiration in seconds
    pub step_up_expiry: i64,

    /// Seconds since last activity before a user shows Offline
    pub presence_window: i64,

    /// Username seeded when the user table is empty
    pub bootstrap_username: String,

    /// Password for the seeded account
    pub bootstrap_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Whether the bulk stock reset writes reversal entries to the
    /// inventory log. Off by default: the reset is treated as outside
    /// history.
    pub log_stock_resets: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCKBOOK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.access_token_expiry", 3600)?
            .set_default("auth.step_up_expiry", 900)?
            .set_default("auth.presence_window", 300)?
            .set_default("auth.bootstrap_username", "admin")?
            .set_default("auth.bootstrap_password", "admin")?
            .set_default("ledger.log_stock_resets", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCKBOOK_ prefix)
            .add_source(
                Environment::with_prefix("STOCKBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
