//! Enriched role profiles published to the application.

use serde::{Deserialize, Serialize};

use crate::records::{ProfileRecord, RegistrarRecord, StudentRecord, TeacherAssignment, TeacherRecord};
use crate::roles::Role;
use crate::tenants::{EducationAuthority, School};

/// Role-specific relational data for a resolved subject.
///
/// The variant always agrees with the session's [`Role`]; use
/// [`RoleProfile::role`] rather than tracking the two separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Escola {
        profile: Option<ProfileRecord>,
        school: Option<School>,
    },
    Professor {
        teacher: Option<TeacherRecord>,
        /// Empty when the assignment lookup failed.
        assignments: Vec<TeacherAssignment>,
        school: Option<School>,
    },
    Aluno {
        student: Option<StudentRecord>,
        school: Option<School>,
    },
    Encarregado {
        dependents: Vec<StudentRecord>,
        /// School of the first dependent.
        school: Option<School>,
    },
    Secretario {
        registrar: Option<RegistrarRecord>,
        school: Option<School>,
    },
    DirecaoMunicipal {
        profile: Option<ProfileRecord>,
        authority: Option<EducationAuthority>,
    },
    DirecaoProvincial {
        profile: Option<ProfileRecord>,
        authority: Option<EducationAuthority>,
    },
    Superadmin {
        profile: Option<ProfileRecord>,
    },
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Escola { .. } => Role::Escola,
            RoleProfile::Professor { .. } => Role::Professor,
            RoleProfile::Aluno { .. } => Role::Aluno,
            RoleProfile::Encarregado { .. } => Role::Encarregado,
            RoleProfile::Secretario { .. } => Role::Secretario,
            RoleProfile::DirecaoMunicipal { .. } => Role::DirecaoMunicipal,
            RoleProfile::DirecaoProvincial { .. } => Role::DirecaoProvincial,
            RoleProfile::Superadmin { .. } => Role::Superadmin,
        }
    }

    /// The school tenant attached to a school-bound profile.
    pub fn school(&self) -> Option<&School> {
        match self {
            RoleProfile::Escola { school, .. }
            | RoleProfile::Professor { school, .. }
            | RoleProfile::Aluno { school, .. }
            | RoleProfile::Encarregado { school, .. }
            | RoleProfile::Secretario { school, .. } => school.as_ref(),
            _ => None,
        }
    }

    pub fn authority(&self) -> Option<&EducationAuthority> {
        match self {
            RoleProfile::DirecaoMunicipal { authority, .. }
            | RoleProfile::DirecaoProvincial { authority, .. } => authority.as_ref(),
            _ => None,
        }
    }
}
