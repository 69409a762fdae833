//! # Escolar Auth
//!
//! The boundary between the identity engine and whatever authenticates users.
//!
//! - [`provider`]: The [`AuthProvider`] port: current subject, event stream, sign-out
//! - [`events`]: Session-change events ([`AuthEvent`])
//! - [`channel`]: [`ChannelAuthProvider`], an in-process provider over a broadcast channel
//! - [`claims`] / [`jwt`]: Subject tokens, so a session can be started from a bearer token
//!
//! Authentication itself (passwords, token issuance policy) lives outside
//! this workspace; the engine only needs to know *who* signed in.

pub mod channel;
pub mod claims;
pub mod events;
pub mod jwt;
pub mod provider;

pub use channel::{ChannelAuthProvider, CurrentSubjectHold};
pub use claims::SubjectClaims;
pub use events::{AuthEvent, AuthEventKind};
pub use escolar_models::Subject;
pub use jwt::{issue_subject_token, verify_subject_token};
pub use provider::{AuthError, AuthProvider};
