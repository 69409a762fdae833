#![allow(dead_code)]

use fake::Fake;
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use std::sync::Arc;

use escolar::models::{
    AuthorityId, AuthorityLevel, EducationAuthority, Email, ProfileId, ProfileRecord,
    RegistrarId, RegistrarRecord, School, SchoolId, StudentId, StudentRecord, SubjectId,
    TeacherId, TeacherRecord,
};
use escolar::{
    ChannelAuthProvider, MemoryRepository, Role, SessionConfig, SessionCoordinator,
    SessionHandle, SessionState, Subject,
};

/// A subject with random id and email.
pub fn random_subject() -> Subject {
    let email: String = SafeEmail().fake();
    Subject::new(SubjectId::new(), Email::new_unchecked(email))
}

pub fn active_school() -> School {
    School {
        id: SchoolId::new(),
        name: CompanyName().fake(),
        active: true,
        blocked: false,
        block_reason: None,
        suspended: false,
    }
}

/// Seeded in-memory repository plus an auth provider signed in as `subject`.
pub struct Fixture {
    pub repo: Arc<MemoryRepository>,
    pub auth: Arc<ChannelAuthProvider>,
    pub subject: Subject,
}

impl Fixture {
    pub fn new() -> Self {
        let subject = random_subject();
        Self {
            repo: Arc::new(MemoryRepository::new()),
            auth: Arc::new(ChannelAuthProvider::with_subject(subject.clone())),
            subject,
        }
    }

    /// Provider without a current session.
    pub fn signed_out() -> Self {
        Self {
            repo: Arc::new(MemoryRepository::new()),
            auth: Arc::new(ChannelAuthProvider::new()),
            subject: random_subject(),
        }
    }

    pub fn spawn(&self) -> SessionHandle {
        self.spawn_with(SessionConfig::default())
    }

    pub fn spawn_with(&self, config: SessionConfig) -> SessionHandle {
        SessionCoordinator::spawn(self.repo.clone(), self.auth.clone(), config)
    }

    pub fn school(&self, school: School) -> SchoolId {
        let id = school.id;
        self.repo.insert_school(school);
        id
    }

    pub fn explicit_profile(&self, role: Role, school_id: Option<SchoolId>) -> ProfileId {
        let id = ProfileId::new();
        self.repo.insert_profile(ProfileRecord {
            id,
            subject_id: self.subject.id,
            role: role.as_str().to_string(),
            school_id,
            authority_id: None,
            display_name: Some(Name().fake()),
            active: true,
        });
        id
    }

    pub fn authority_profile(&self, role: Role, authority_id: AuthorityId) {
        self.repo.insert_profile(ProfileRecord {
            id: ProfileId::new(),
            subject_id: self.subject.id,
            role: role.as_str().to_string(),
            school_id: None,
            authority_id: Some(authority_id),
            display_name: None,
            active: true,
        });
    }

    /// Teacher row reachable only through the subject's email, in a different case.
    pub fn orphaned_teacher(&self, school_id: SchoolId) -> TeacherId {
        let id = TeacherId::new();
        self.repo.insert_teacher(TeacherRecord {
            id,
            subject_id: None,
            school_id: Some(school_id),
            name: Name().fake(),
            email: Email::new_unchecked(self.subject.email.as_str().to_uppercase()),
            active: true,
        });
        id
    }

    pub fn student_of(&self, school_id: SchoolId, guardian: Option<SubjectId>) -> StudentRecord {
        let student = StudentRecord {
            id: StudentId::new(),
            subject_id: None,
            guardian_subject_id: guardian,
            name: Name().fake(),
            class_id: None,
            class_name: Some("8ª C".into()),
            school_id: Some(school_id),
            active: true,
        };
        self.repo.insert_student(student.clone());
        student
    }

    /// The subject itself enrolled as a student.
    pub fn enrolled(&self, school_id: SchoolId) {
        self.repo.insert_student(StudentRecord {
            id: StudentId::new(),
            subject_id: Some(self.subject.id),
            guardian_subject_id: None,
            name: Name().fake(),
            class_id: None,
            class_name: Some("12ª A".into()),
            school_id: Some(school_id),
            active: true,
        });
    }

    pub fn registrar(&self, school_id: SchoolId) -> RegistrarId {
        let id = RegistrarId::new();
        self.repo.insert_registrar(RegistrarRecord {
            id,
            subject_id: self.subject.id,
            school_id: Some(school_id),
            name: Name().fake(),
            active: true,
        });
        id
    }

    pub fn authority(&self, level: AuthorityLevel, active: bool) -> AuthorityId {
        let id = AuthorityId::new();
        self.repo.insert_authority(EducationAuthority {
            id,
            subject_id: Some(self.subject.id),
            level,
            name: CompanyName().fake(),
            province: "Benguela".into(),
            municipality: matches!(level, AuthorityLevel::Municipal).then(|| "Lobito".to_string()),
            active,
        });
        id
    }
}

/// Waits for the first state that is not loading.
pub async fn settled(handle: &SessionHandle) -> SessionState {
    handle
        .wait_until(|s| !s.is_loading)
        .await
        .expect("session coordinator stopped")
}
