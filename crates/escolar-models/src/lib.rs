//! # Escolar Models
//!
//! Domain models for the Escolar identity-resolution engine.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed ids for subjects, tenants and role rows
//! - [`value_types`]: Validated primitives ([`Email`])
//! - [`subject`]: The authenticated [`Subject`]
//! - [`roles`]: The closed [`Role`] set and each role's tenant binding
//! - [`tenants`]: Schools, education authorities, [`TenantStatus`] and [`BlockInfo`]
//! - [`records`]: Role rows returned by the repository
//! - [`profiles`]: Enriched [`RoleProfile`] variants
//! - [`session`]: The published [`SessionState`]

pub mod ids;
pub mod profiles;
pub mod records;
pub mod roles;
pub mod session;
pub mod subject;
pub mod tenants;
pub mod value_types;

pub use ids::{
    AuthorityId, ClassId, CourseId, ProfileId, RegistrarId, SchoolId, StudentId, SubjectId,
    TeacherId,
};
pub use profiles::RoleProfile;
pub use records::{
    NewProfile, ProfileRecord, RegistrarRecord, StudentRecord, TeacherAssignment, TeacherRecord,
};
pub use roles::{Role, TenantBinding, UnknownRole};
pub use session::{RoleFlags, SessionPhase, SessionState};
pub use subject::Subject;
pub use tenants::{
    AuthorityLevel, AuthorityStatus, BlockInfo, BlockKind, EducationAuthority, School, Tenant,
    TenantKind, TenantStatus, PENDING_APPROVAL_MESSAGE, SUSPENDED_MESSAGE,
};
pub use value_types::{Email, ValueTypeError};
