//! PostgreSQL connection settings.
//!
//! - `DATABASE_URL`: connection string (no default; the binary refuses to start without it)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)

use std::env;

use crate::env_parse;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
        }
    }
}
