use serde::{Deserialize, Serialize};
use std::fmt;

use escolar_models::Subject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    TokenRefreshed,
    SignedOut,
}

/// A discrete session change reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// Subject of the session after the change; `None` for sign-outs.
    pub subject: Option<Subject>,
}

impl AuthEvent {
    pub fn signed_in(subject: Subject) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            subject: Some(subject),
        }
    }

    pub fn token_refreshed(subject: Subject) -> Self {
        Self {
            kind: AuthEventKind::TokenRefreshed,
            subject: Some(subject),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            subject: None,
        }
    }

    /// Whether the event asks for the resolution pipeline to run.
    pub fn triggers_resolution(&self) -> bool {
        matches!(
            self.kind,
            AuthEventKind::SignedIn | AuthEventKind::TokenRefreshed
        )
    }
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{:?} for {}", self.kind, subject),
            None => write!(f, "{:?}", self.kind),
        }
    }
}
