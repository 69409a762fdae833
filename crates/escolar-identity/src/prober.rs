//! Role probing.
//!
//! A subject is matched against [`ProbeStep::ORDER`]; the first probe that
//! matches decides the role. Only the explicit-profile probe is canonical, so
//! only its failure aborts resolution. Fallback probes that fail are logged
//! and count as misses.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use escolar_db::{Repository, RepositoryError, RepositoryResult};
use escolar_models::{
    EducationAuthority, NewProfile, ProfileRecord, RegistrarRecord, Role, StudentRecord, Subject,
    TeacherRecord,
};
use escolar_observability::{track_corrective_write, track_probe_match};

/// One repository lookup that may map a subject to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeStep {
    ExplicitProfile,
    TeacherBySubject,
    TeacherByEmail,
    StudentBySubject,
    GuardianOfStudent,
    RegistrarBySubject,
    PendingProvincialAuthority,
}

impl ProbeStep {
    /// Probe precedence. Student is checked before guardian, so a subject
    /// who is both resolves as a student.
    pub const ORDER: [ProbeStep; 7] = [
        ProbeStep::ExplicitProfile,
        ProbeStep::TeacherBySubject,
        ProbeStep::TeacherByEmail,
        ProbeStep::StudentBySubject,
        ProbeStep::GuardianOfStudent,
        ProbeStep::RegistrarBySubject,
        ProbeStep::PendingProvincialAuthority,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeStep::ExplicitProfile => "explicit_profile",
            ProbeStep::TeacherBySubject => "teacher_by_subject",
            ProbeStep::TeacherByEmail => "teacher_by_email",
            ProbeStep::StudentBySubject => "student_by_subject",
            ProbeStep::GuardianOfStudent => "guardian_of_student",
            ProbeStep::RegistrarBySubject => "registrar_by_subject",
            ProbeStep::PendingProvincialAuthority => "pending_provincial_authority",
        }
    }

    /// A failing query on a fatal probe aborts resolution instead of falling through.
    pub fn is_fatal(self) -> bool {
        matches!(self, ProbeStep::ExplicitProfile)
    }
}

impl fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The row that linked a subject to its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkData {
    Profile(ProfileRecord),
    Teacher(TeacherRecord),
    Student(StudentRecord),
    /// All active dependents, oldest first. Never empty.
    Guardian { dependents: Vec<StudentRecord> },
    Registrar(RegistrarRecord),
    /// Provincial authority registration still awaiting approval.
    PendingAuthority(EducationAuthority),
}

#[derive(Debug)]
pub enum ResolutionOutcome {
    Found {
        role: Role,
        link: LinkData,
        matched_by: ProbeStep,
    },
    NotFound,
    RepositoryError {
        cause: RepositoryError,
    },
}

impl ResolutionOutcome {
    pub fn role(&self) -> Option<Role> {
        match self {
            ResolutionOutcome::Found { role, .. } => Some(*role),
            _ => None,
        }
    }
}

pub struct RoleProber {
    repo: Arc<dyn Repository>,
}

impl RoleProber {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, subject), fields(subject.id = %subject.id))]
    pub async fn resolve(&self, subject: &Subject) -> ResolutionOutcome {
        for step in ProbeStep::ORDER {
            match self.probe(step, subject).await {
                Ok(Some((role, link))) => {
                    debug!(probe = %step, %role, "Probe matched");
                    track_probe_match(step.as_str());
                    return ResolutionOutcome::Found {
                        role,
                        link,
                        matched_by: step,
                    };
                }
                Ok(None) => debug!(probe = %step, "Probe missed"),
                Err(cause) if step.is_fatal() => {
                    error!(probe = %step, error = %cause, "Canonical probe failed");
                    return ResolutionOutcome::RepositoryError { cause };
                }
                Err(cause) => {
                    warn!(probe = %step, error = %cause, "Probe failed, treating as no match");
                }
            }
        }

        debug!("No probe matched");
        ResolutionOutcome::NotFound
    }

    /// Runs a single probe, including its corrective write.
    pub async fn probe(
        &self,
        step: ProbeStep,
        subject: &Subject,
    ) -> RepositoryResult<Option<(Role, LinkData)>> {
        match step {
            ProbeStep::ExplicitProfile => self.explicit_profile(subject).await,
            ProbeStep::TeacherBySubject => Ok(self
                .repo
                .find_teacher_by_subject(subject.id)
                .await?
                .map(|teacher| (Role::Professor, LinkData::Teacher(teacher)))),
            ProbeStep::TeacherByEmail => self.teacher_by_email(subject).await,
            ProbeStep::StudentBySubject => Ok(self
                .repo
                .find_student_by_subject(subject.id)
                .await?
                .map(|student| (Role::Aluno, LinkData::Student(student)))),
            ProbeStep::GuardianOfStudent => {
                let dependents = self.repo.find_dependents(subject.id).await?;
                if dependents.is_empty() {
                    return Ok(None);
                }
                Ok(Some((Role::Encarregado, LinkData::Guardian { dependents })))
            }
            ProbeStep::RegistrarBySubject => self.registrar(subject).await,
            ProbeStep::PendingProvincialAuthority => Ok(self
                .repo
                .find_pending_provincial_authority(subject.id)
                .await?
                .map(|authority| {
                    (
                        Role::DirecaoProvincial,
                        LinkData::PendingAuthority(authority),
                    )
                })),
        }
    }

    async fn explicit_profile(
        &self,
        subject: &Subject,
    ) -> RepositoryResult<Option<(Role, LinkData)>> {
        let Some(profile) = self.repo.find_active_profile(subject.id).await? else {
            return Ok(None);
        };

        match profile.role() {
            Ok(role) => Ok(Some((role, LinkData::Profile(profile)))),
            Err(e) => {
                warn!(profile.id = %profile.id, error = %e, "Ignoring profile with unknown role");
                Ok(None)
            }
        }
    }

    /// Teacher row created before the subject existed: bind it now.
    async fn teacher_by_email(
        &self,
        subject: &Subject,
    ) -> RepositoryResult<Option<(Role, LinkData)>> {
        let Some(mut teacher) = self
            .repo
            .find_teacher_by_email(&subject.email, subject.id)
            .await?
        else {
            return Ok(None);
        };

        if teacher.subject_id.is_some_and(|owner| owner != subject.id) {
            warn!(teacher.id = %teacher.id, "Teacher with matching email belongs to another subject");
            return Ok(None);
        }

        if teacher.subject_id != Some(subject.id) {
            match self.repo.link_teacher(teacher.id, subject.id).await {
                Ok(()) => {
                    info!(teacher.id = %teacher.id, "Linked orphaned teacher record to subject");
                    teacher.subject_id = Some(subject.id);
                    track_corrective_write("link_teacher", true);
                }
                Err(e) => {
                    warn!(teacher.id = %teacher.id, error = %e, "Failed to link teacher record");
                    track_corrective_write("link_teacher", false);
                }
            }
        }

        Ok(Some((Role::Professor, LinkData::Teacher(teacher))))
    }

    /// Registrar without an explicit profile: create one so the next
    /// resolution stops at the first probe.
    async fn registrar(&self, subject: &Subject) -> RepositoryResult<Option<(Role, LinkData)>> {
        let Some(registrar) = self.repo.find_registrar_by_subject(subject.id).await? else {
            return Ok(None);
        };

        let profile = NewProfile {
            subject_id: subject.id,
            role: Role::Secretario,
            school_id: registrar.school_id,
            authority_id: None,
            display_name: Some(registrar.name.clone()),
        };

        match self.repo.upsert_profile(&profile).await {
            Ok(()) => {
                info!(registrar.id = %registrar.id, "Created missing registrar profile");
                track_corrective_write("upsert_profile", true);
            }
            Err(e) => {
                warn!(registrar.id = %registrar.id, error = %e, "Failed to create registrar profile");
                track_corrective_write("upsert_profile", false);
            }
        }

        Ok(Some((Role::Secretario, LinkData::Registrar(registrar))))
    }
}
