//! Strongly-typed ID newtypes for identity and tenant records.
//!
//! Each row kind the resolution engine touches gets its own wrapper around
//! `Uuid`, so a `TeacherId` can never be handed to a lookup expecting a
//! `SchoolId`. All ids encode to and decode from a Postgres `uuid` column and
//! serialize as a plain UUID string.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from a u128 value (useful for fixtures).
            #[inline]
            pub const fn from_u128(v: u128) -> Self {
                Self(Uuid::from_u128(v))
            }

            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            #[inline]
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Identity issued by the external auth provider.
    SubjectId
);

define_id!(
    /// Explicit role-profile row.
    ProfileId
);

define_id!(
    /// School tenant.
    SchoolId
);

define_id!(
    /// Municipal or provincial education authority registration.
    AuthorityId
);

define_id!(TeacherId);

define_id!(StudentId);

define_id!(ClassId);

define_id!(
    /// Course taught within a class (a "disciplina").
    CourseId
);

define_id!(RegistrarId);
