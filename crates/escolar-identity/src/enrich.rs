//! Profile enrichment.
//!
//! Fetches the relational payload of a role that passed the gate. Sub-query
//! failures are logged and replaced by empty values; enrichment never fails.

use std::sync::Arc;
use tracing::{instrument, warn};

use escolar_db::{Repository, RepositoryResult};
use escolar_models::{ProfileRecord, Role, RoleProfile, Subject, TeacherAssignment, TeacherId, Tenant};

use crate::prober::LinkData;

pub struct ProfileEnricher {
    repo: Arc<dyn Repository>,
}

impl ProfileEnricher {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Builds the profile for `role`. Returns `None` only for
    /// [`Role::Unresolved`], which the prober never yields.
    #[instrument(skip(self, subject, link, tenant), fields(subject.id = %subject.id))]
    pub async fn enrich(
        &self,
        subject: &Subject,
        role: Role,
        link: LinkData,
        tenant: Option<Tenant>,
    ) -> Option<RoleProfile> {
        let school = tenant.as_ref().and_then(Tenant::as_school).cloned();
        let authority = tenant.as_ref().and_then(Tenant::as_authority).cloned();

        let profile = match role {
            Role::Escola => RoleProfile::Escola {
                profile: explicit(link),
                school,
            },
            Role::Professor => {
                let teacher = match link {
                    LinkData::Teacher(teacher) => Some(teacher),
                    _ => or_default(
                        "teacher",
                        self.repo.find_teacher_by_subject(subject.id).await,
                    ),
                };
                let assignments = match &teacher {
                    Some(teacher) => self.assignments(teacher.id).await,
                    None => Vec::new(),
                };
                RoleProfile::Professor {
                    teacher,
                    assignments,
                    school,
                }
            }
            Role::Aluno => {
                let student = match link {
                    LinkData::Student(student) => Some(student),
                    _ => or_default(
                        "student",
                        self.repo.find_student_by_subject(subject.id).await,
                    ),
                };
                RoleProfile::Aluno { student, school }
            }
            Role::Encarregado => {
                let dependents = match link {
                    LinkData::Guardian { dependents } => dependents,
                    _ => or_default("dependents", self.repo.find_dependents(subject.id).await),
                };
                RoleProfile::Encarregado { dependents, school }
            }
            Role::Secretario => {
                let registrar = match link {
                    LinkData::Registrar(registrar) => Some(registrar),
                    _ => or_default(
                        "registrar",
                        self.repo.find_registrar_by_subject(subject.id).await,
                    ),
                };
                RoleProfile::Secretario { registrar, school }
            }
            Role::DirecaoMunicipal => RoleProfile::DirecaoMunicipal {
                profile: explicit(link),
                authority,
            },
            Role::DirecaoProvincial => RoleProfile::DirecaoProvincial {
                profile: explicit(link),
                authority,
            },
            Role::Superadmin => RoleProfile::Superadmin {
                profile: explicit(link),
            },
            Role::Unresolved => return None,
        };

        Some(profile)
    }

    async fn assignments(&self, teacher_id: TeacherId) -> Vec<TeacherAssignment> {
        match self.repo.find_teacher_assignments(teacher_id).await {
            Ok(assignments) => assignments,
            Err(e) if e.is_policy_denied() => {
                warn!(teacher.id = %teacher_id, "Assignments hidden by policy, continuing without them");
                Vec::new()
            }
            Err(e) => {
                warn!(teacher.id = %teacher_id, error = %e, "Failed to load assignments");
                Vec::new()
            }
        }
    }
}

fn explicit(link: LinkData) -> Option<ProfileRecord> {
    match link {
        LinkData::Profile(profile) => Some(profile),
        _ => None,
    }
}

fn or_default<T: Default>(what: &str, result: RepositoryResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(lookup = what, error = %e, "Enrichment lookup failed");
        T::default()
    })
}
