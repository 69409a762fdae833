//! # Escolar
//!
//! Identity resolution for a multi-tenant school-management system.
//!
//! An authenticated subject (an opaque id plus an email) is resolved to
//! exactly one typed role profile: institution administrator, teacher,
//! student, guardian, registrar, municipal or provincial education authority,
//! or super-administrator. Resolution handles role rows created before the
//! subject was linked, tenants that are deleted, blocked or suspended, and
//! concurrent triggers from the auth provider, and it never leaves the
//! session loading indefinitely.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── escolar-core/          # AppError for the binary boundary
//! ├── escolar-config/        # Environment-driven configuration
//! ├── escolar-models/        # Ids, roles, tenants, profiles, SessionState
//! ├── escolar-db/            # Repository port, PostgreSQL and in-memory adapters
//! ├── escolar-auth/          # Auth provider port, events, subject tokens
//! ├── escolar-identity/      # Role prober, tenant gate, profile enrichers
//! ├── escolar-session/       # Session coordinator actor
//! └── escolar-observability/ # Tracing and metrics
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use escolar::{ChannelAuthProvider, PgRepository, SessionConfig, SessionCoordinator};
//!
//! let repo = Arc::new(PgRepository::new(pool));
//! let auth = Arc::new(ChannelAuthProvider::with_subject(subject));
//! let session = SessionCoordinator::spawn(repo, auth, SessionConfig::from_env());
//!
//! let state = session.wait_until(|s| !s.is_loading).await?;
//! if let Some(block) = &state.block_reason {
//!     // render the blocking modal
//! }
//! ```

pub use escolar_auth as auth;
pub use escolar_config as config;
pub use escolar_db as db;
pub use escolar_identity as identity;
pub use escolar_models as models;
pub use escolar_observability as observability;
pub use escolar_session as session;

pub use escolar_auth::{AuthEvent, AuthProvider, ChannelAuthProvider};
pub use escolar_config::{DatabaseConfig, JwtConfig, SessionConfig};
pub use escolar_db::{MemoryRepository, PgRepository, Repository};
pub use escolar_identity::{IdentityPipeline, PipelineOutcome};
pub use escolar_models::{BlockInfo, Role, RoleProfile, SessionPhase, SessionState, Subject};
pub use escolar_session::{RefreshOutcome, SessionCoordinator, SessionError, SessionHandle};
