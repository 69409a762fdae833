use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use escolar_models::Subject;

use crate::events::AuthEvent;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("token claims are malformed: {0}")]
    InvalidClaims(String),

    #[error("failed to create token: {0}")]
    TokenEncoding(String),

    #[error("auth provider error: {0}")]
    Provider(String),
}

/// External auth provider, as seen by the session coordinator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// One-shot query for the subject of the current session, if any.
    async fn current_subject(&self) -> Result<Option<Subject>, AuthError>;

    /// Stream of session changes. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Ends the provider-side session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
