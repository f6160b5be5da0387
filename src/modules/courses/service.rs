use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::courses::model::{
    Chapter, Course, CourseDetails, CreateChapterDto, CreateCourseDto, Enrollment,
    EnrollmentOutcome,
};
use crate::modules::users::model::{Role, User};
use crate::utils::errors::AppError;

const COURSE_COLUMNS: &str = "id, title, description, teacher_id, created_at, updated_at";
const CHAPTER_COLUMNS: &str = r#"id, course_id, title, content, "order", created_at, updated_at"#;

pub struct CourseService;

impl CourseService {
    #[instrument(skip(db))]
    pub async fn list_courses(db: &PgPool) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses ORDER BY created_at DESC"
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch courses")
        .map_err(AppError::database)?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, course_id: Uuid) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(course_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch course by ID")
        .map_err(AppError::database)?;

        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn get_course_with_chapters(
        db: &PgPool,
        course_id: Uuid,
    ) -> Result<Option<CourseDetails>, AppError> {
        let Some(course) = Self::get_course(db, course_id).await? else {
            return Ok(None);
        };

        let chapters = Self::chapters_of(db, course_id).await?;

        Ok(Some(CourseDetails { course, chapters }))
    }

    #[instrument(skip(db, dto))]
    pub async fn create_course(
        db: &PgPool,
        teacher_id: Uuid,
        dto: CreateCourseDto,
    ) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (title, description, teacher_id)
             VALUES ($1, $2, $3)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(teacher_id)
        .fetch_one(db)
        .await
        .context("Failed to insert course")
        .map_err(AppError::database)?;

        Ok(course)
    }

    /// Adds a chapter if the course exists and belongs to the teacher.
    /// "Course missing" and "not the owner" collapse into one 404 so
    /// non-owners cannot probe for course existence.
    #[instrument(skip(db, dto))]
    pub async fn add_chapter(
        db: &PgPool,
        course_id: Uuid,
        teacher_id: Uuid,
        dto: CreateChapterDto,
    ) -> Result<Chapter, AppError> {
        if !Self::owns_course(db, course_id, teacher_id).await? {
            return Err(AppError::not_found(
                "Course not found or you are not the teacher of this course",
            ));
        }

        let chapter = sqlx::query_as::<_, Chapter>(&format!(
            r#"INSERT INTO chapters (course_id, title, content, "order")
               VALUES ($1, $2, $3, $4)
               RETURNING {CHAPTER_COLUMNS}"#
        ))
        .bind(course_id)
        .bind(&dto.title)
        .bind(&dto.content)
        .bind(dto.order)
        .fetch_one(db)
        .await
        .context("Failed to insert chapter")
        .map_err(AppError::database)?;

        Ok(chapter)
    }

    /// Chapters of a course, visible to the owning teacher and enrolled
    /// students.
    #[instrument(skip(db))]
    pub async fn list_chapters(
        db: &PgPool,
        course_id: Uuid,
        requester_id: Uuid,
        requester_role: Role,
    ) -> Result<Vec<Chapter>, AppError> {
        let Some(course) = Self::get_course(db, course_id).await? else {
            return Err(AppError::not_found("Course not found"));
        };

        let allowed = match requester_role {
            Role::Teacher => course.teacher_id == requester_id,
            Role::Student => Self::is_enrolled(db, requester_id, course_id).await?,
        };

        if !allowed {
            return Err(AppError::forbidden(
                "Access denied: you are not enrolled in this course",
            ));
        }

        Self::chapters_of(db, course_id).await
    }

    /// Enrolls a student, on behalf of the teacher owning the course.
    /// Re-enrolling an existing pair is a soft outcome, not an error;
    /// the unique constraint resolves a racing double-insert the same
    /// way.
    #[instrument(skip(db))]
    pub async fn enroll_student(
        db: &PgPool,
        course_id: Uuid,
        student_id: Uuid,
        requesting_teacher_id: Uuid,
    ) -> Result<EnrollmentOutcome, AppError> {
        if !Self::owns_course(db, course_id, requesting_teacher_id).await? {
            return Err(AppError::forbidden(
                "Course not found or you are not authorized to manage enrollments for this course",
            ));
        }

        let student = sqlx::query_as::<_, User>(
            "SELECT id, username, email, role, first_name, last_name, profile_picture_url,
                    created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(student_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(format!("Student with id {} not found", student_id)))?;

        if student.role != Role::Student {
            return Err(AppError::bad_request(format!(
                "User {} is not a student and cannot be enrolled",
                student.username
            )));
        }

        if Self::is_enrolled(db, student_id, course_id).await? {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        let result = sqlx::query_as::<_, Enrollment>(
            "INSERT INTO enrollments (student_id, course_id)
             VALUES ($1, $2)
             RETURNING id, student_id, course_id, enrolled_at",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(db)
        .await;

        match result {
            Ok(enrollment) => Ok(EnrollmentOutcome::Enrolled(enrollment)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(EnrollmentOutcome::AlreadyEnrolled)
            }
            Err(e) => Err(AppError::database(e)),
        }
    }

    /// `None` when the student is not enrolled; the controller decides
    /// between 404 and 403 with a follow-up existence check.
    #[instrument(skip(db))]
    pub async fn get_course_details_for_student(
        db: &PgPool,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<CourseDetails>, AppError> {
        if !Self::is_enrolled(db, student_id, course_id).await? {
            return Ok(None);
        }

        Self::get_course_with_chapters(db, course_id).await
    }

    #[instrument(skip(db))]
    pub async fn list_enrolled_courses(
        db: &PgPool,
        student_id: Uuid,
    ) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT c.id, c.title, c.description, c.teacher_id, c.created_at, c.updated_at
             FROM courses c
             JOIN enrollments e ON e.course_id = c.id
             WHERE e.student_id = $1
             ORDER BY c.title",
        )
        .bind(student_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch enrolled courses")
        .map_err(AppError::database)?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn list_teaching(db: &PgPool, teacher_id: Uuid) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE teacher_id = $1 ORDER BY title"
        ))
        .bind(teacher_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch taught courses")
        .map_err(AppError::database)?;

        Ok(courses)
    }

    /// Roster of a course, for its owning teacher. Same collapsed 404 as
    /// [`Self::add_chapter`].
    #[instrument(skip(db))]
    pub async fn list_enrolled_students(
        db: &PgPool,
        course_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<Vec<User>, AppError> {
        if !Self::owns_course(db, course_id, teacher_id).await? {
            return Err(AppError::not_found(
                "Course not found or you are not the teacher of this course",
            ));
        }

        let students = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.role, u.first_name, u.last_name,
                    u.profile_picture_url, u.created_at, u.updated_at
             FROM users u
             JOIN enrollments e ON e.student_id = u.id
             WHERE e.course_id = $1
             ORDER BY u.username",
        )
        .bind(course_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch enrolled students")
        .map_err(AppError::database)?;

        Ok(students)
    }

    pub async fn is_enrolled(
        db: &PgPool,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM enrollments WHERE student_id = $1 AND course_id = $2",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_optional(db)
        .await
        .context("Failed to check enrollment")
        .map_err(AppError::database)?;

        Ok(found.is_some())
    }

    async fn owns_course(
        db: &PgPool,
        course_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM courses WHERE id = $1 AND teacher_id = $2",
        )
        .bind(course_id)
        .bind(teacher_id)
        .fetch_optional(db)
        .await
        .context("Failed to check course ownership")
        .map_err(AppError::database)?;

        Ok(found.is_some())
    }

    async fn chapters_of(db: &PgPool, course_id: Uuid) -> Result<Vec<Chapter>, AppError> {
        let chapters = sqlx::query_as::<_, Chapter>(&format!(
            r#"SELECT {CHAPTER_COLUMNS} FROM chapters WHERE course_id = $1 ORDER BY "order" ASC"#
        ))
        .bind(course_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch chapters")
        .map_err(AppError::database)?;

        Ok(chapters)
    }
}
