//! JWT claim structure for subject tokens.

use serde::{Deserialize, Serialize};

/// Claims of a token that identifies a subject and nothing else; roles are
/// resolved from the repository, never carried in the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectClaims {
    /// Subject id
    pub sub: String,
    pub email: String,
    /// Expiration (Unix timestamp)
    pub exp: usize,
    /// Issued-at (Unix timestamp)
    pub iat: usize,
}
