use anyhow::Error;
use serde::Serialize;
use serde_json::json;
use std::fmt;

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Internal,
    NotFound,
    BadRequest,
    Unauthorized,
    Database,
    Timeout,
}

impl ErrorKind {
    /// Process exit code used by the administrative binary.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Internal => 1,
            Self::BadRequest => 2,
            Self::NotFound => 3,
            Self::Unauthorized => 4,
            Self::Database => 5,
            Self::Timeout => 6,
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(kind: ErrorKind, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Internal, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::NotFound, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::BadRequest, err)
    }

    pub fn unauthorized<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Unauthorized, err)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Database, err)
    }

    pub fn timeout<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Timeout, err)
    }

    /// JSON body printed by the binary on failure.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "kind": self.kind,
            "error": format!("{:#}", self.error),
        })
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {:#}", self.kind, self.error)
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}
