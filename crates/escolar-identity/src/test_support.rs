use std::sync::Arc;

use escolar_db::MemoryRepository;
use escolar_models::{
    AuthorityId, AuthorityLevel, EducationAuthority, Email, ProfileId, ProfileRecord,
    RegistrarId, RegistrarRecord, Role, School, SchoolId, StudentId, StudentRecord, Subject,
    SubjectId, TeacherId, TeacherRecord,
};

pub const SCHOOL: SchoolId = SchoolId::from_u128(100);

pub fn repo() -> Arc<MemoryRepository> {
    Arc::new(MemoryRepository::new())
}

pub fn subject(n: u128, email: &str) -> Subject {
    Subject::new(SubjectId::from_u128(n), Email::new_unchecked(email))
}

pub fn school(id: SchoolId) -> School {
    School {
        id,
        name: "Escola Secundária do Lubango".into(),
        active: true,
        blocked: false,
        block_reason: None,
        suspended: false,
    }
}

pub fn profile(subject: &Subject, role: Role, school_id: Option<SchoolId>) -> ProfileRecord {
    ProfileRecord {
        id: ProfileId::new(),
        subject_id: subject.id,
        role: role.as_str().to_string(),
        school_id,
        authority_id: None,
        display_name: None,
        active: true,
    }
}

pub fn teacher(subject_id: Option<SubjectId>, email: &str) -> TeacherRecord {
    TeacherRecord {
        id: TeacherId::new(),
        subject_id,
        school_id: Some(SCHOOL),
        name: "Maria Domingos".into(),
        email: Email::new_unchecked(email),
        active: true,
    }
}

pub fn student(subject_id: Option<SubjectId>, guardian: Option<SubjectId>) -> StudentRecord {
    StudentRecord {
        id: StudentId::new(),
        subject_id,
        guardian_subject_id: guardian,
        name: "João Kiala".into(),
        class_id: None,
        class_name: Some("10ª A".into()),
        school_id: Some(SCHOOL),
        active: true,
    }
}

pub fn registrar(subject_id: SubjectId) -> RegistrarRecord {
    RegistrarRecord {
        id: RegistrarId::new(),
        subject_id,
        school_id: Some(SCHOOL),
        name: "Ana Tchissola".into(),
        active: true,
    }
}

pub fn authority(subject_id: Option<SubjectId>, level: AuthorityLevel, active: bool) -> EducationAuthority {
    EducationAuthority {
        id: AuthorityId::new(),
        subject_id,
        level,
        name: "Direcção Provincial da Huíla".into(),
        province: "Huíla".into(),
        municipality: None,
        active,
    }
}
