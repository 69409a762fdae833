//! In-memory adapter for the repository port.
//!
//! Tables are plain vectors behind a mutex. Besides serving lookups the
//! adapter records every call it receives and can be told to fail or stall a
//! given [`Operation`], which is how the resolution engine's fallback and
//! timeout paths are exercised without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use escolar_models::{
    AuthorityId, AuthorityLevel, EducationAuthority, Email, NewProfile, ProfileId, ProfileRecord,
    RegistrarRecord, School, SchoolId, StudentRecord, SubjectId, TeacherAssignment, TeacherId,
    TeacherRecord,
};

use crate::{Operation, Repository, RepositoryError, RepositoryResult};

/// Injected behavior for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with [`RepositoryError::Unavailable`].
    Unavailable,
    /// Fail with [`RepositoryError::PolicyDenied`].
    PolicyDenied,
    /// Never complete.
    Stall,
}

#[derive(Debug, Default)]
struct Tables {
    profiles: Vec<ProfileRecord>,
    teachers: Vec<TeacherRecord>,
    students: Vec<StudentRecord>,
    registrars: Vec<RegistrarRecord>,
    schools: Vec<School>,
    authorities: Vec<EducationAuthority>,
    assignments: Vec<TeacherAssignment>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
    faults: Mutex<HashMap<Operation, Fault>>,
    calls: Mutex<Vec<Operation>>,
    latency: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: ProfileRecord) {
        lock(&self.tables).profiles.push(profile);
    }

    pub fn insert_teacher(&self, teacher: TeacherRecord) {
        lock(&self.tables).teachers.push(teacher);
    }

    pub fn insert_student(&self, student: StudentRecord) {
        lock(&self.tables).students.push(student);
    }

    pub fn insert_registrar(&self, registrar: RegistrarRecord) {
        lock(&self.tables).registrars.push(registrar);
    }

    pub fn insert_school(&self, school: School) {
        let mut tables = lock(&self.tables);
        tables.schools.retain(|s| s.id != school.id);
        tables.schools.push(school);
    }

    pub fn insert_authority(&self, authority: EducationAuthority) {
        lock(&self.tables).authorities.push(authority);
    }

    pub fn insert_assignment(&self, assignment: TeacherAssignment) {
        lock(&self.tables).assignments.push(assignment);
    }

    /// Deletes a school row, leaving anything that referenced it dangling.
    pub fn remove_school(&self, school_id: SchoolId) {
        lock(&self.tables).schools.retain(|s| s.id != school_id);
    }

    /// Applies `change` to a stored school.
    pub fn update_school(&self, school_id: SchoolId, change: impl FnOnce(&mut School)) {
        if let Some(school) = lock(&self.tables)
            .schools
            .iter_mut()
            .find(|s| s.id == school_id)
        {
            change(school);
        }
    }

    pub fn profile_for(&self, subject_id: SubjectId) -> Option<ProfileRecord> {
        lock(&self.tables)
            .profiles
            .iter()
            .find(|p| p.subject_id == subject_id)
            .cloned()
    }

    pub fn teacher(&self, teacher_id: TeacherId) -> Option<TeacherRecord> {
        lock(&self.tables)
            .teachers
            .iter()
            .find(|t| t.id == teacher_id)
            .cloned()
    }

    pub fn fail(&self, operation: Operation, fault: Fault) {
        lock(&self.faults).insert(operation, fault);
    }

    pub fn clear_fault(&self, operation: Operation) {
        lock(&self.faults).remove(&operation);
    }

    /// Delays every call by `latency` before it is served.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    /// Every operation received so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, operation: Operation) -> usize {
        lock(&self.calls).iter().filter(|op| **op == operation).count()
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Records the call, waits out latency and applies any injected fault.
    async fn enter(&self, operation: Operation) -> RepositoryResult<()> {
        lock(&self.calls).push(operation);

        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let fault = lock(&self.faults).get(&operation).copied();
        match fault {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(RepositoryError::Unavailable(format!(
                "injected failure on {}",
                operation
            ))),
            Some(Fault::PolicyDenied) => Err(RepositoryError::PolicyDenied {
                table: operation.table(),
            }),
            Some(Fault::Stall) => {
                debug!(%operation, "Stalling repository call");
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_active_profile(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<ProfileRecord>> {
        self.enter(Operation::ActiveProfile).await?;
        Ok(lock(&self.tables)
            .profiles
            .iter()
            .find(|p| p.subject_id == subject_id && p.active)
            .cloned())
    }

    async fn find_teacher_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<TeacherRecord>> {
        self.enter(Operation::TeacherBySubject).await?;
        Ok(lock(&self.tables)
            .teachers
            .iter()
            .find(|t| t.subject_id == Some(subject_id) && t.active)
            .cloned())
    }

    async fn find_teacher_by_email(
        &self,
        email: &Email,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<TeacherRecord>> {
        self.enter(Operation::TeacherByEmail).await?;
        Ok(lock(&self.tables)
            .teachers
            .iter()
            .find(|t| {
                t.email.matches(email)
                    && t.active
                    && t.subject_id.is_none_or(|id| id == subject_id)
            })
            .cloned())
    }

    async fn link_teacher(
        &self,
        teacher_id: TeacherId,
        subject_id: SubjectId,
    ) -> RepositoryResult<()> {
        self.enter(Operation::LinkTeacher).await?;
        let mut tables = lock(&self.tables);
        let teacher = tables
            .teachers
            .iter_mut()
            .find(|t| t.id == teacher_id && t.subject_id.is_none_or(|s| s == subject_id))
            .ok_or(RepositoryError::NotUpdated { table: "teachers" })?;
        teacher.subject_id = Some(subject_id);
        Ok(())
    }

    async fn find_student_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<StudentRecord>> {
        self.enter(Operation::StudentBySubject).await?;
        Ok(lock(&self.tables)
            .students
            .iter()
            .find(|s| s.subject_id == Some(subject_id) && s.active)
            .cloned())
    }

    async fn find_dependents(
        &self,
        guardian_subject_id: SubjectId,
    ) -> RepositoryResult<Vec<StudentRecord>> {
        self.enter(Operation::Dependents).await?;
        Ok(lock(&self.tables)
            .students
            .iter()
            .filter(|s| s.guardian_subject_id == Some(guardian_subject_id) && s.active)
            .cloned()
            .collect())
    }

    async fn find_registrar_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<RegistrarRecord>> {
        self.enter(Operation::RegistrarBySubject).await?;
        Ok(lock(&self.tables)
            .registrars
            .iter()
            .find(|r| r.subject_id == subject_id && r.active)
            .cloned())
    }

    async fn upsert_profile(&self, profile: &NewProfile) -> RepositoryResult<()> {
        self.enter(Operation::UpsertProfile).await?;
        let mut tables = lock(&self.tables);
        let role = profile.role.as_str().to_string();

        match tables
            .profiles
            .iter_mut()
            .find(|p| p.subject_id == profile.subject_id)
        {
            Some(existing) => {
                existing.role = role;
                existing.school_id = profile.school_id;
                existing.authority_id = profile.authority_id;
                if profile.display_name.is_some() {
                    existing.display_name = profile.display_name.clone();
                }
                existing.active = true;
            }
            None => tables.profiles.push(ProfileRecord {
                id: ProfileId::new(),
                subject_id: profile.subject_id,
                role,
                school_id: profile.school_id,
                authority_id: profile.authority_id,
                display_name: profile.display_name.clone(),
                active: true,
            }),
        }
        Ok(())
    }

    async fn find_pending_provincial_authority(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<EducationAuthority>> {
        self.enter(Operation::PendingProvincialAuthority).await?;
        Ok(lock(&self.tables)
            .authorities
            .iter()
            .find(|a| {
                a.level == AuthorityLevel::Provincial
                    && a.subject_id == Some(subject_id)
                    && !a.active
            })
            .cloned())
    }

    async fn find_school(&self, school_id: SchoolId) -> RepositoryResult<Option<School>> {
        self.enter(Operation::School).await?;
        Ok(lock(&self.tables)
            .schools
            .iter()
            .find(|s| s.id == school_id)
            .cloned())
    }

    async fn find_authority(
        &self,
        authority_id: AuthorityId,
        level: AuthorityLevel,
    ) -> RepositoryResult<Option<EducationAuthority>> {
        self.enter(Operation::Authority).await?;
        Ok(lock(&self.tables)
            .authorities
            .iter()
            .find(|a| a.id == authority_id && a.level == level)
            .cloned())
    }

    async fn find_teacher_assignments(
        &self,
        teacher_id: TeacherId,
    ) -> RepositoryResult<Vec<TeacherAssignment>> {
        self.enter(Operation::TeacherAssignments).await?;
        Ok(lock(&self.tables)
            .assignments
            .iter()
            .filter(|a| a.teacher_id == teacher_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escolar_models::Role;

    fn teacher(email: &str, subject_id: Option<SubjectId>) -> TeacherRecord {
        TeacherRecord {
            id: TeacherId::new(),
            subject_id,
            school_id: None,
            name: "Ana Paula".into(),
            email: Email::new(email).unwrap(),
            active: true,
        }
    }

    #[tokio::test]
    async fn test_teacher_by_email_is_case_insensitive() {
        let repo = MemoryRepository::new();
        repo.insert_teacher(teacher("Ana.Paula@Escola.ao", None));

        let email = Email::new("ana.paula@escola.ao").unwrap();
        let found = repo.find_teacher_by_email(&email, SubjectId::new()).await.unwrap();
        assert!(found.is_some());
        assert_eq!(repo.calls(), vec![Operation::TeacherByEmail]);
    }

    #[tokio::test]
    async fn test_teacher_by_email_skips_teacher_of_another_subject() {
        let repo = MemoryRepository::new();
        let owner = SubjectId::new();
        repo.insert_teacher(teacher("prof@escola.ao", Some(owner)));
        let email = Email::new("prof@escola.ao").unwrap();

        assert!(repo.find_teacher_by_email(&email, SubjectId::new()).await.unwrap().is_none());
        assert!(repo.find_teacher_by_email(&email, owner).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_link_teacher_refuses_teacher_linked_elsewhere() {
        let repo = MemoryRepository::new();
        let other = SubjectId::new();
        let record = teacher("prof@escola.ao", Some(other));
        let id = record.id;
        repo.insert_teacher(record);

        let err = repo.link_teacher(id, SubjectId::new()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotUpdated { .. }));
        assert_eq!(repo.teacher(id).unwrap().subject_id, Some(other));
    }

    #[tokio::test]
    async fn test_upsert_profile_replaces_existing_row() {
        let repo = MemoryRepository::new();
        let subject_id = SubjectId::new();
        let mut profile = NewProfile {
            subject_id,
            role: Role::Secretario,
            school_id: None,
            authority_id: None,
            display_name: Some("Secretaria".into()),
        };
        repo.upsert_profile(&profile).await.unwrap();

        profile.school_id = Some(SchoolId::new());
        profile.display_name = None;
        repo.upsert_profile(&profile).await.unwrap();

        let stored = repo.profile_for(subject_id).unwrap();
        assert_eq!(stored.role, "secretario");
        assert_eq!(stored.school_id, profile.school_id);
        assert_eq!(stored.display_name.as_deref(), Some("Secretaria"));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let repo = MemoryRepository::new();
        repo.fail(Operation::School, Fault::PolicyDenied);
        let err = repo.find_school(SchoolId::new()).await.unwrap_err();
        assert!(err.is_policy_denied());

        repo.clear_fault(Operation::School);
        assert!(repo.find_school(SchoolId::new()).await.unwrap().is_none());
        assert_eq!(repo.call_count(Operation::School), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_never_completes() {
        let repo = MemoryRepository::new();
        repo.fail(Operation::ActiveProfile, Fault::Stall);

        let result = tokio::time::timeout(
            Duration::from_secs(30),
            repo.find_active_profile(SubjectId::new()),
        )
        .await;
        assert!(result.is_err());
    }
}
