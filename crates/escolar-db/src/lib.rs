//! # Escolar DB
//!
//! The repository port the identity engine reads and repairs role data
//! through, plus two adapters:
//!
//! - [`postgres::PgRepository`]: SQLx over a PostgreSQL pool (schema in `migrations/`)
//! - [`memory::MemoryRepository`]: seeded in-memory tables with fault injection,
//!   used by tests and local demos
//!
//! Every method maps to exactly one [`Operation`]; the operation names the
//! table touched and is what the in-memory adapter records and fails on.
//!
//! # Example
//!
//! ```ignore
//! use escolar_db::{PgRepository, Repository, init_db_pool};
//!
//! let pool = init_db_pool(&database_config).await?;
//! let repo = PgRepository::new(pool);
//! let profile = repo.find_active_profile(subject_id).await?;
//! ```

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;

use escolar_models::{
    AuthorityId, AuthorityLevel, EducationAuthority, Email, NewProfile, ProfileRecord,
    RegistrarRecord, School, SchoolId, StudentRecord, SubjectId, TeacherAssignment, TeacherId,
    TeacherRecord,
};

pub use error::{RepositoryError, RepositoryResult};
pub use memory::{Fault, MemoryRepository};
pub use postgres::{PgRepository, init_db_pool};

/// A single repository call, named after what it reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ActiveProfile,
    TeacherBySubject,
    TeacherByEmail,
    LinkTeacher,
    StudentBySubject,
    Dependents,
    RegistrarBySubject,
    UpsertProfile,
    PendingProvincialAuthority,
    School,
    Authority,
    TeacherAssignments,
}

impl Operation {
    pub fn table(self) -> &'static str {
        match self {
            Operation::ActiveProfile | Operation::UpsertProfile => "user_profiles",
            Operation::TeacherBySubject | Operation::TeacherByEmail | Operation::LinkTeacher => {
                "teachers"
            }
            Operation::StudentBySubject | Operation::Dependents => "students",
            Operation::RegistrarBySubject => "registrars",
            Operation::PendingProvincialAuthority => "provincial_authorities",
            Operation::School => "schools",
            Operation::Authority => "authorities",
            Operation::TeacherAssignments => "teacher_assignments",
        }
    }

    pub fn is_write(self) -> bool {
        matches!(self, Operation::LinkTeacher | Operation::UpsertProfile)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Typed read/write operations against role, tenant and cross-reference tables.
///
/// Lookups filtered to active rows say so in their docs; everything else
/// returns the row regardless of flags so the gate can judge it.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Explicit role-profile for the subject, active rows only.
    async fn find_active_profile(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<ProfileRecord>>;

    /// Active teacher linked to the subject.
    async fn find_teacher_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<TeacherRecord>>;

    /// Active teacher whose email matches, compared case-insensitively, that
    /// is either unlinked or already bound to `subject_id`.
    async fn find_teacher_by_email(
        &self,
        email: &Email,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<TeacherRecord>>;

    /// Binds an unlinked teacher row to the subject.
    async fn link_teacher(&self, teacher_id: TeacherId, subject_id: SubjectId)
    -> RepositoryResult<()>;

    /// Active student linked to the subject, joined with its class.
    async fn find_student_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<StudentRecord>>;

    /// Active students whose guardian is the subject, oldest first.
    async fn find_dependents(
        &self,
        guardian_subject_id: SubjectId,
    ) -> RepositoryResult<Vec<StudentRecord>>;

    /// Active registrar linked to the subject.
    async fn find_registrar_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<RegistrarRecord>>;

    /// Creates or replaces the explicit profile keyed by subject id.
    async fn upsert_profile(&self, profile: &NewProfile) -> RepositoryResult<()>;

    /// Provincial authority registration for the subject that is not yet active.
    async fn find_pending_provincial_authority(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<EducationAuthority>>;

    async fn find_school(&self, school_id: SchoolId) -> RepositoryResult<Option<School>>;

    async fn find_authority(
        &self,
        authority_id: AuthorityId,
        level: AuthorityLevel,
    ) -> RepositoryResult<Option<EducationAuthority>>;

    async fn find_teacher_assignments(
        &self,
        teacher_id: TeacherId,
    ) -> RepositoryResult<Vec<TeacherAssignment>>;
}
