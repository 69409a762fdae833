use std::env;

use crate::env_parse;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub subject_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            subject_token_expiry: env_parse("JWT_SUBJECT_EXPIRY").unwrap_or(3600), // 1 hour
        }
    }
}
