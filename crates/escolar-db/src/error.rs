use thiserror::Error;

/// SQLSTATE raised when a row-level security policy or grant denies access.
const INSUFFICIENT_PRIVILEGE: &str = "42501";

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error on {table}: {source}")]
    Database {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("access to {table} denied by authorization policy")]
    PolicyDenied { table: &'static str },

    #[error("no row updated in {table}")]
    NotUpdated { table: &'static str },

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Classifies a SQLx error raised while touching `table`.
    pub fn from_sqlx(table: &'static str, source: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &source
            && db_err.code().as_deref() == Some(INSUFFICIENT_PRIVILEGE)
        {
            return Self::PolicyDenied { table };
        }

        match source {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(format!("{} ({})", source, table))
            }
            source => Self::Database { table, source },
        }
    }

    pub fn is_policy_denied(&self) -> bool {
        matches!(self, Self::PolicyDenied { .. })
    }
}
