//! Subject tokens.
//!
//! A subject token is an HS256 JWT carrying the subject id and email. The
//! administrative binary accepts one to start a session; tests use
//! [`issue_subject_token`] to mint them.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use escolar_config::JwtConfig;
use escolar_models::{Email, Subject, SubjectId};

use crate::claims::SubjectClaims;
use crate::provider::AuthError;

/// # Errors
///
/// Returns [`AuthError::TokenEncoding`] if encoding fails.
pub fn issue_subject_token(subject: &Subject, jwt_config: &JwtConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.subject_token_expiry.max(0) as usize;

    let claims = SubjectClaims {
        sub: subject.id.to_string(),
        email: subject.email.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenEncoding(e.to_string()))
}

/// Verifies signature and expiry, then rebuilds the [`Subject`].
///
/// # Errors
///
/// - [`AuthError::InvalidToken`] for a bad signature, expired or malformed token
/// - [`AuthError::InvalidClaims`] when `sub` is not a UUID or `email` is invalid
pub fn verify_subject_token(token: &str, jwt_config: &JwtConfig) -> Result<Subject, AuthError> {
    let claims = decode::<SubjectClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)?;

    let id = Uuid::parse_str(&claims.sub)
        .map(SubjectId::from)
        .map_err(|e| AuthError::InvalidClaims(format!("sub: {}", e)))?;
    let email = Email::new(claims.email).map_err(|e| AuthError::InvalidClaims(e.to_string()))?;

    Ok(Subject::new(id, email))
}
