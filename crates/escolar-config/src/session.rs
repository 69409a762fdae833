//! Session coordinator configuration.
//!
//! # Configuration
//!
//! - `SESSION_SAFETY_TIMEOUT_SECS`: Upper bound on how long a session may stay
//!   in the loading state before it is forced to unresolved (default: 8)
//! - `SESSION_SIGN_OUT_TIMEOUT_SECS`: Upper bound on a forced sign-out call (default: 5)
//! - `SESSION_COMMAND_BUFFER`: Capacity of the coordinator's command channel (default: 64)

use std::time::Duration;

use crate::env_parse;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backstop against a hung repository call leaving the session loading.
    pub safety_timeout: Duration,

    /// Bound on the external sign-out call issued for blocked or unknown subjects.
    pub sign_out_timeout: Duration,

    /// Capacity of the command channel feeding the coordinator.
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            safety_timeout: Duration::from_secs(8),
            sign_out_timeout: Duration::from_secs(5),
            command_buffer: 64,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            safety_timeout: env_parse::<u64>("SESSION_SAFETY_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.safety_timeout),
            sign_out_timeout: env_parse::<u64>("SESSION_SIGN_OUT_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sign_out_timeout),
            command_buffer: env_parse::<usize>("SESSION_COMMAND_BUFFER")
                .filter(|size| *size > 0)
                .unwrap_or(defaults.command_buffer),
        }
    }

    /// Overrides the safety timeout, keeping the other settings.
    #[must_use]
    pub fn with_safety_timeout(mut self, timeout: Duration) -> Self {
        self.safety_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SessionConfig::default();
        assert_eq!(config.safety_timeout, Duration::from_secs(8));
        assert_eq!(config.sign_out_timeout, Duration::from_secs(5));
        assert_eq!(config.command_buffer, 64);
    }

    #[test]
    fn test_with_safety_timeout() {
        let config = SessionConfig::default().with_safety_timeout(Duration::from_millis(250));
        assert_eq!(config.safety_timeout, Duration::from_millis(250));
        assert_eq!(config.command_buffer, 64);
    }
}
