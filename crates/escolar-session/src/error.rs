use std::time::Duration;
use thiserror::Error;

use escolar_auth::AuthError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session coordinator has stopped")]
    Closed,

    #[error("sign-out failed: {0}")]
    SignOut(#[from] AuthError),

    #[error("sign-out did not complete within {0:?}")]
    SignOutTimedOut(Duration),
}
