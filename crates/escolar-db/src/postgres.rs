//! PostgreSQL adapter for the repository port.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, instrument};

use escolar_config::DatabaseConfig;
use escolar_models::{
    AuthorityId, AuthorityLevel, EducationAuthority, Email, NewProfile, ProfileRecord,
    RegistrarRecord, School, SchoolId, StudentRecord, SubjectId, TeacherAssignment, TeacherId,
    TeacherRecord,
};

use crate::{Repository, RepositoryError, RepositoryResult};

const PROFILE_COLUMNS: &str =
    "id, subject_id, role, school_id, authority_id, display_name, active";
const TEACHER_COLUMNS: &str = "id, subject_id, school_id, name, email, active";
const STUDENT_SELECT: &str = "SELECT s.id, s.subject_id, s.guardian_subject_id, s.name, s.class_id, \
     c.name AS class_name, c.school_id, s.active \
     FROM students s LEFT JOIN classes c ON c.id = s.class_id";

/// Connects a pool using the configured URL and size.
///
/// # Errors
///
/// Returns [`RepositoryError::Unavailable`] when `DATABASE_URL` is unset or the
/// first connection cannot be established.
pub async fn init_db_pool(config: &DatabaseConfig) -> RepositoryResult<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| RepositoryError::Unavailable("DATABASE_URL must be set".into()))?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(|e| RepositoryError::Unavailable(format!("failed to connect to database: {}", e)))
}

#[derive(Clone, Debug)]
pub struct PgRepository {
    db: PgPool,
}

impl PgRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }

    fn authority_query(level: AuthorityLevel) -> &'static str {
        match level {
            AuthorityLevel::Municipal => {
                "SELECT id, subject_id, 'municipal' AS level, name, province, municipality, active \
                 FROM municipal_authorities WHERE id = $1"
            }
            AuthorityLevel::Provincial => {
                "SELECT id, subject_id, 'provincial' AS level, name, province, \
                 NULL::text AS municipality, active \
                 FROM provincial_authorities WHERE id = $1"
            }
        }
    }
}

#[async_trait]
impl Repository for PgRepository {
    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "user_profiles"))]
    async fn find_active_profile(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<ProfileRecord>> {
        let sql = format!(
            "SELECT {} FROM user_profiles WHERE subject_id = $1 AND active = true LIMIT 1",
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, ProfileRecord>(&sql)
            .bind(subject_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| RepositoryError::from_sqlx("user_profiles", e))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "teachers"))]
    async fn find_teacher_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<TeacherRecord>> {
        let sql = format!(
            "SELECT {} FROM teachers WHERE subject_id = $1 AND active = true LIMIT 1",
            TEACHER_COLUMNS
        );

        sqlx::query_as::<_, TeacherRecord>(&sql)
            .bind(subject_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| RepositoryError::from_sqlx("teachers", e))
    }

    #[instrument(skip(self, email), fields(db.operation = "SELECT", db.table = "teachers"))]
    async fn find_teacher_by_email(
        &self,
        email: &Email,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<TeacherRecord>> {
        let sql = format!(
            "SELECT {} FROM teachers WHERE lower(email) = $1 AND active = true \
             AND (subject_id IS NULL OR subject_id = $2) \
             ORDER BY created_at, id LIMIT 1",
            TEACHER_COLUMNS
        );

        sqlx::query_as::<_, TeacherRecord>(&sql)
            .bind(email.normalized())
            .bind(subject_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| RepositoryError::from_sqlx("teachers", e))
    }

    #[instrument(skip(self), fields(db.operation = "UPDATE", db.table = "teachers"))]
    async fn link_teacher(
        &self,
        teacher_id: TeacherId,
        subject_id: SubjectId,
    ) -> RepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE teachers SET subject_id = $2, updated_at = now() \
             WHERE id = $1 AND (subject_id IS NULL OR subject_id = $2)",
        )
        .bind(teacher_id)
        .bind(subject_id)
        .execute(&self.db)
        .await
        .map_err(|e| RepositoryError::from_sqlx("teachers", e))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotUpdated { table: "teachers" });
        }

        debug!(teacher.id = %teacher_id, "Teacher linked to subject");
        Ok(())
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "students"))]
    async fn find_student_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<StudentRecord>> {
        let sql = format!(
            "{} WHERE s.subject_id = $1 AND s.active = true LIMIT 1",
            STUDENT_SELECT
        );

        sqlx::query_as::<_, StudentRecord>(&sql)
            .bind(subject_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| RepositoryError::from_sqlx("students", e))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "students"))]
    async fn find_dependents(
        &self,
        guardian_subject_id: SubjectId,
    ) -> RepositoryResult<Vec<StudentRecord>> {
        let sql = format!(
            "{} WHERE s.guardian_subject_id = $1 AND s.active = true ORDER BY s.created_at, s.id",
            STUDENT_SELECT
        );

        sqlx::query_as::<_, StudentRecord>(&sql)
            .bind(guardian_subject_id)
            .fetch_all(&self.db)
            .await
            .map_err(|e| RepositoryError::from_sqlx("students", e))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "registrars"))]
    async fn find_registrar_by_subject(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<RegistrarRecord>> {
        sqlx::query_as::<_, RegistrarRecord>(
            "SELECT id, subject_id, school_id, name, active FROM registrars \
             WHERE subject_id = $1 AND active = true LIMIT 1",
        )
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| RepositoryError::from_sqlx("registrars", e))
    }

    #[instrument(skip(self, profile), fields(db.operation = "UPSERT", db.table = "user_profiles", subject.id = %profile.subject_id))]
    async fn upsert_profile(&self, profile: &NewProfile) -> RepositoryResult<()> {
        sqlx::query(
            "INSERT INTO user_profiles (subject_id, role, school_id, authority_id, display_name, active) \
             VALUES ($1, $2, $3, $4, $5, true) \
             ON CONFLICT (subject_id) DO UPDATE SET \
                 role = EXCLUDED.role, \
                 school_id = EXCLUDED.school_id, \
                 authority_id = EXCLUDED.authority_id, \
                 display_name = COALESCE(EXCLUDED.display_name, user_profiles.display_name), \
                 active = true, \
                 updated_at = now()",
        )
        .bind(profile.subject_id)
        .bind(profile.role.as_str())
        .bind(profile.school_id)
        .bind(profile.authority_id)
        .bind(profile.display_name.as_deref())
        .execute(&self.db)
        .await
        .map_err(|e| RepositoryError::from_sqlx("user_profiles", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "provincial_authorities"))]
    async fn find_pending_provincial_authority(
        &self,
        subject_id: SubjectId,
    ) -> RepositoryResult<Option<EducationAuthority>> {
        sqlx::query_as::<_, EducationAuthority>(
            "SELECT id, subject_id, 'provincial' AS level, name, province, \
             NULL::text AS municipality, active \
             FROM provincial_authorities WHERE subject_id = $1 AND active = false LIMIT 1",
        )
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| RepositoryError::from_sqlx("provincial_authorities", e))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "schools"))]
    async fn find_school(&self, school_id: SchoolId) -> RepositoryResult<Option<School>> {
        sqlx::query_as::<_, School>(
            "SELECT id, name, active, blocked, block_reason, suspended FROM schools WHERE id = $1",
        )
        .bind(school_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| RepositoryError::from_sqlx("schools", e))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", authority.level = level.as_str()))]
    async fn find_authority(
        &self,
        authority_id: AuthorityId,
        level: AuthorityLevel,
    ) -> RepositoryResult<Option<EducationAuthority>> {
        let table = match level {
            AuthorityLevel::Municipal => "municipal_authorities",
            AuthorityLevel::Provincial => "provincial_authorities",
        };

        sqlx::query_as::<_, EducationAuthority>(Self::authority_query(level))
            .bind(authority_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| RepositoryError::from_sqlx(table, e))
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "teacher_assignments"))]
    async fn find_teacher_assignments(
        &self,
        teacher_id: TeacherId,
    ) -> RepositoryResult<Vec<TeacherAssignment>> {
        sqlx::query_as::<_, TeacherAssignment>(
            "SELECT ta.teacher_id, ta.class_id, c.name AS class_name, \
                    ta.course_id, co.name AS course_name \
             FROM teacher_assignments ta \
             INNER JOIN classes c ON c.id = ta.class_id \
             LEFT JOIN courses co ON co.id = ta.course_id \
             WHERE ta.teacher_id = $1 \
             ORDER BY c.name, co.name",
        )
        .bind(teacher_id)
        .fetch_all(&self.db)
        .await
        .map_err(|e| RepositoryError::from_sqlx("teacher_assignments", e))
    }
}
