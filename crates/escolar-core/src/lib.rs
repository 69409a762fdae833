//! # Escolar Core
//!
//! Foundational types shared across the Escolar workspace.
//!
//! - [`errors`]: Application error type used at the binary boundary
//!
//! Library crates keep their own `thiserror` enums (repository, auth and
//! session errors). Those convert into [`AppError`] when they reach the
//! administrative binary, where they are rendered for an operator.
//!
//! # Example
//!
//! ```ignore
//! use escolar_core::errors::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Subject not found"));
//! assert_eq!(error.kind.exit_code(), 3);
//! ```

pub mod errors;

pub use errors::{AppError, ErrorKind};
