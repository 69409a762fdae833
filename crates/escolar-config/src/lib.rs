//! # Escolar Config
//!
//! Configuration types for the Escolar identity engine.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`session`]: Session coordinator timing and buffering
//! - [`database`]: PostgreSQL connection settings
//! - [`jwt`]: Subject token signing configuration
//!
//! Every `from_env` constructor falls back to a default when a variable is
//! missing or cannot be parsed, so a bare environment still yields a usable
//! configuration. Call [`load_dotenv`] first to pick up a local `.env` file.
//!
//! # Example
//!
//! ```ignore
//! use escolar_config::{SessionConfig, DatabaseConfig, JwtConfig};
//!
//! escolar_config::load_dotenv();
//! let session = SessionConfig::from_env();
//! let database = DatabaseConfig::from_env();
//! let jwt = JwtConfig::from_env();
//! ```

pub mod database;
pub mod jwt;
pub mod session;

pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use session::SessionConfig;

/// Loads a `.env` file from the working directory if one exists.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
