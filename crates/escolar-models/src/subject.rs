use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::SubjectId;
use crate::value_types::Email;

/// Identity reported by the external auth provider, before any role is known.
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub email: Email,
}

impl Subject {
    pub fn new(id: SubjectId, email: Email) -> Self {
        Self { id, email }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.id, self.email)
    }
}
