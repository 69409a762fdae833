//! Role rows as the repository returns them, before enrichment.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{
    AuthorityId, ClassId, CourseId, ProfileId, RegistrarId, SchoolId, StudentId, SubjectId,
    TeacherId,
};
use crate::roles::{Role, UnknownRole};
use crate::value_types::Email;

/// Explicit role-profile row, the canonical join point between a subject and its role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub subject_id: SubjectId,
    /// Stored role name, parsed with [`ProfileRecord::role`].
    pub role: String,
    pub school_id: Option<SchoolId>,
    pub authority_id: Option<AuthorityId>,
    pub display_name: Option<String>,
    pub active: bool,
}

impl ProfileRecord {
    pub fn role(&self) -> Result<Role, UnknownRole> {
        self.role.parse()
    }
}

/// Profile row written by the registrar corrective upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub subject_id: SubjectId,
    pub role: Role,
    pub school_id: Option<SchoolId>,
    pub authority_id: Option<AuthorityId>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherRecord {
    pub id: TeacherId,
    /// Missing on rows created before subjects were linked to teachers.
    pub subject_id: Option<SubjectId>,
    pub school_id: Option<SchoolId>,
    pub name: String,
    pub email: Email,
    pub active: bool,
}

/// Student row joined with its class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StudentRecord {
    pub id: StudentId,
    pub subject_id: Option<SubjectId>,
    pub guardian_subject_id: Option<SubjectId>,
    pub name: String,
    pub class_id: Option<ClassId>,
    pub class_name: Option<String>,
    /// School of the student's class.
    pub school_id: Option<SchoolId>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RegistrarRecord {
    pub id: RegistrarId,
    pub subject_id: SubjectId,
    pub school_id: Option<SchoolId>,
    pub name: String,
    pub active: bool,
}

/// One class/course a teacher is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherAssignment {
    pub teacher_id: TeacherId,
    pub class_id: ClassId,
    pub class_name: String,
    pub course_id: Option<CourseId>,
    pub course_name: Option<String>,
}
