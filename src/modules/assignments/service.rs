use anyhow::Context;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::modules::assignments::model::{
    Assignment, CreateAssignmentDto, GradeSubmissionDto, Submission, SubmitAssignmentDto,
};
use crate::modules::courses::service::CourseService;
use crate::utils::errors::AppError;

const ASSIGNMENT_COLUMNS: &str =
    "id, course_id, chapter_id, title, description, due_date, created_at, updated_at";
const SUBMISSION_COLUMNS: &str = "id, assignment_id, student_id, submission_type, content_text, \
                                  file_url, submitted_at, grade, feedback";

pub struct AssignmentService;

impl AssignmentService {
    /// Assignments of a course, for an enrolled student. Ordered by due
    /// date ascending; assignments without a due date sort last.
    #[instrument(skip(db))]
    pub async fn list_for_course(
        db: &PgPool,
        course_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<Assignment>, AppError> {
        if !CourseService::is_enrolled(db, student_id, course_id).await? {
            if CourseService::get_course(db, course_id).await?.is_none() {
                return Err(AppError::not_found("Course not found"));
            }
            return Err(AppError::forbidden("You are not enrolled in this course"));
        }

        let assignments = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments
             WHERE course_id = $1
             ORDER BY due_date ASC NULLS LAST, created_at ASC"
        ))
        .bind(course_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch assignments")
        .map_err(AppError::database)?;

        Ok(assignments)
    }

    /// Creates an assignment in an owned course. The ownership failure is
    /// collapsed so other teachers cannot probe course existence; a
    /// chapter reference must point into the same course.
    #[instrument(skip(db, dto))]
    pub async fn create_for_course(
        db: &PgPool,
        teacher_id: Uuid,
        course_id: Uuid,
        dto: CreateAssignmentDto,
    ) -> Result<Assignment, AppError> {
        let owns = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM courses WHERE id = $1 AND teacher_id = $2",
        )
        .bind(course_id)
        .bind(teacher_id)
        .fetch_optional(db)
        .await
        .context("Failed to check course ownership")
        .map_err(AppError::database)?;

        if owns.is_none() {
            return Err(AppError::forbidden(
                "Course not found or you are not the teacher of this course",
            ));
        }

        if let Some(chapter_id) = dto.chapter_id {
            let chapter = sqlx::query_scalar::<_, Uuid>(
                "SELECT id FROM chapters WHERE id = $1 AND course_id = $2",
            )
            .bind(chapter_id)
            .bind(course_id)
            .fetch_optional(db)
            .await
            .context("Failed to check chapter")
            .map_err(AppError::database)?;

            if chapter.is_none() {
                return Err(AppError::bad_request(format!(
                    "Chapter {} does not belong to this course",
                    chapter_id
                )));
            }
        }

        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            "INSERT INTO assignments (course_id, chapter_id, title, description, due_date)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(course_id)
        .bind(dto.chapter_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.due_date)
        .fetch_one(db)
        .await
        .context("Failed to insert assignment")
        .map_err(AppError::database)?;

        Ok(assignment)
    }

    /// Stores a student's submission, exactly once per (assignment,
    /// student). The pre-check gives the friendly 409; the unique
    /// constraint catches a racing duplicate and is translated to the
    /// same 409 rather than surfacing a storage error.
    #[instrument(skip(db, dto))]
    pub async fn submit(
        db: &PgPool,
        student_id: Uuid,
        assignment_id: Uuid,
        dto: SubmitAssignmentDto,
    ) -> Result<Submission, AppError> {
        let assignment = Self::fetch_assignment(db, assignment_id).await?;

        if !CourseService::is_enrolled(db, student_id, assignment.course_id).await? {
            return Err(AppError::forbidden(
                "You are not enrolled in the course for this assignment",
            ));
        }

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM submissions WHERE assignment_id = $1 AND student_id = $2",
        )
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(db)
        .await
        .context("Failed to check for existing submission")
        .map_err(AppError::database)?;

        if existing.is_some() {
            return Err(AppError::conflict(
                "You have already submitted this assignment",
            ));
        }

        // The boundary already ran this; the service does not trust it.
        dto.check_content()?;

        let result = sqlx::query_as::<_, Submission>(&format!(
            "INSERT INTO submissions (assignment_id, student_id, submission_type, content_text, file_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(assignment_id)
        .bind(student_id)
        .bind(dto.submission_type)
        .bind(&dto.content_text)
        .bind(&dto.file_url)
        .fetch_one(db)
        .await;

        match result {
            Ok(submission) => Ok(submission),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::conflict("You have already submitted this assignment"),
            ),
            Err(e) => Err(AppError::database(e)),
        }
    }

    #[instrument(skip(db))]
    pub async fn get_own_submission(
        db: &PgPool,
        student_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<Submission>, AppError> {
        let assignment = Self::fetch_assignment(db, assignment_id).await?;

        if !CourseService::is_enrolled(db, student_id, assignment.course_id).await? {
            return Err(AppError::forbidden(
                "You are not enrolled in the course for this assignment",
            ));
        }

        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE assignment_id = $1 AND student_id = $2"
        ))
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch submission")
        .map_err(AppError::database)?;

        Ok(submission)
    }

    /// All submissions of an assignment, for the teacher owning its
    /// course. Ordered by submission time ascending.
    #[instrument(skip(db))]
    pub async fn list_submissions(
        db: &PgPool,
        teacher_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        let assignment = Self::fetch_assignment(db, assignment_id).await?;

        let owner = sqlx::query_scalar::<_, Uuid>("SELECT teacher_id FROM courses WHERE id = $1")
            .bind(assignment.course_id)
            .fetch_one(db)
            .await
            .context("Failed to fetch course owner")
            .map_err(AppError::database)?;

        if owner != teacher_id {
            return Err(AppError::forbidden(
                "You are not authorized to view submissions for this assignment",
            ));
        }

        let submissions = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions
             WHERE assignment_id = $1
             ORDER BY submitted_at ASC"
        ))
        .bind(assignment_id)
        .fetch_all(db)
        .await
        .context("Failed to fetch submissions")
        .map_err(AppError::database)?;

        Ok(submissions)
    }

    /// Grades a submission, following submission → assignment → course →
    /// teacher for the ownership check. Re-grading overwrites the prior
    /// grade and feedback; no history is kept.
    #[instrument(skip(db, dto))]
    pub async fn grade(
        db: &PgPool,
        teacher_id: Uuid,
        submission_id: Uuid,
        dto: GradeSubmissionDto,
    ) -> Result<Submission, AppError> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT c.teacher_id
             FROM submissions s
             JOIN assignments a ON a.id = s.assignment_id
             JOIN courses c ON c.id = a.course_id
             WHERE s.id = $1",
        )
        .bind(submission_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch submission owner chain")
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::not_found(format!("Submission with id {} not found", submission_id))
        })?;

        if owner != teacher_id {
            return Err(AppError::forbidden(
                "You are not authorized to grade this submission",
            ));
        }

        let submission = sqlx::query_as::<_, Submission>(&format!(
            "UPDATE submissions
             SET grade = $1, feedback = $2
             WHERE id = $3
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(&dto.grade)
        .bind(&dto.feedback)
        .bind(submission_id)
        .fetch_one(db)
        .await
        .context("Failed to update grade")
        .map_err(AppError::database)?;

        Ok(submission)
    }

    async fn fetch_assignment(db: &PgPool, assignment_id: Uuid) -> Result<Assignment, AppError> {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
        ))
        .bind(assignment_id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch assignment")
        .map_err(AppError::database)?
        .ok_or_else(|| {
            AppError::not_found(format!("Assignment with id {} not found", assignment_id))
        })
    }
}
