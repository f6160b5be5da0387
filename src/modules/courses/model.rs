use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub teacher_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Chapter {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    /// Ordering intent within the course; not enforced unique.
    pub order: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub enrolled_at: chrono::DateTime<chrono::Utc>,
}

/// A course with its chapters, ordered by their `order` field.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseDetails {
    pub course: Course,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateChapterDto {
    #[validate(length(min = 1))]
    pub title: String,
    pub content: String,
    pub order: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EnrollStudentDto {
    pub student_id: Uuid,
}

/// Outcome of an enrollment request. Enrolling an already-enrolled
/// student is not an error, but the caller answers 200 rather than 201.
#[derive(Debug)]
pub enum EnrollmentOutcome {
    Enrolled(Enrollment),
    AlreadyEnrolled,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<Enrollment>,
}
