//! Validated value types for domain primitives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTypeError {
    InvalidEmail(String),
}

impl std::error::Error for ValueTypeError {}

impl fmt::Display for ValueTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
        }
    }
}

/// A validated email address.
///
/// Subjects carry the email the auth provider reported; the teacher-by-email
/// probe compares it case-insensitively through [`Email::normalized`].
/// Values decoded from the database are trusted and not re-validated.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, ValueTypeError> {
        let email = email.into().trim().to_string();

        if email.is_empty() {
            return Err(ValueTypeError::InvalidEmail("email cannot be empty".into()));
        }

        if !email.validate_email() {
            return Err(ValueTypeError::InvalidEmail(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Self(email))
    }

    /// Wrap a value loaded from a trusted source without validating it.
    #[inline]
    pub fn new_unchecked(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for case-insensitive matching.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn matches(&self, other: &Email) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Email({})", self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Email {
    type Err = ValueTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Email {
    type Error = ValueTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Email {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email_is_trimmed() {
        let email = Email::new("  prof@escola.ao ").unwrap();
        assert_eq!(email.as_str(), "prof@escola.ao");
    }

    #[test]
    fn test_invalid_emails() {
        assert!(Email::new("").is_err());
        assert!(Email::new("not-an-email").is_err());
        assert!("@escola.ao".parse::<Email>().is_err());
    }

    #[test]
    fn test_matches_ignores_case() {
        let a = Email::new("Prof.Silva@Escola.ao").unwrap();
        let b = Email::new("prof.silva@escola.ao").unwrap();
        assert!(a.matches(&b));
        assert_eq!(a.normalized(), "prof.silva@escola.ao");
        assert_ne!(a, b);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<Email, _> = serde_json::from_str(r#""aluno@escola.ao""#);
        assert!(ok.is_ok());
        let bad: Result<Email, _> = serde_json::from_str(r#""nope""#);
        assert!(bad.is_err());
    }
}
