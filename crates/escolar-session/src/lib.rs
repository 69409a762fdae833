//! # Escolar Session
//!
//! The session coordinator: the single owner of the published
//! [`SessionState`](escolar_models::SessionState).
//!
//! It runs the identity pipeline on start-up and on auth events, keeps at
//! most one run in flight, forces blocked or unknown subjects out, and never
//! lets the session stay loading past the configured safety timeout.
//!
//! ```ignore
//! let handle = SessionCoordinator::spawn(repo, auth, SessionConfig::from_env());
//! let state = handle.wait_until(|s| !s.is_loading).await?;
//! ```

mod coordinator;
mod error;
mod handle;

pub use coordinator::{RefreshOutcome, SessionCoordinator};
pub use error::SessionError;
pub use handle::SessionHandle;
