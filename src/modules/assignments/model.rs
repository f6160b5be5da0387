use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::utils::errors::AppError;

/// How a submission's content is delivered. `file_upload` and `url`
/// both carry their payload in `file_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "submission_type", rename_all = "snake_case")]
pub enum SubmissionType {
    Text,
    FileUpload,
    Url,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub chapter_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub submission_type: SubmissionType,
    pub content_text: Option<String>,
    pub file_url: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub grade: Option<String>,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAssignmentDto {
    #[validate(length(min = 1))]
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    /// When set, must reference a chapter of the same course.
    pub chapter_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitAssignmentDto {
    pub submission_type: SubmissionType,
    pub content_text: Option<String>,
    pub file_url: Option<String>,
}

impl SubmitAssignmentDto {
    /// Required-field-by-type rule. Applied at the boundary and again in
    /// the service; neither layer trusts the other.
    pub fn check_content(&self) -> Result<(), AppError> {
        match self.submission_type {
            SubmissionType::Text => {
                if self.content_text.as_deref().unwrap_or("").is_empty() {
                    return Err(AppError::bad_request(
                        "content_text is required for text submissions",
                    ));
                }
            }
            SubmissionType::FileUpload | SubmissionType::Url => {
                if self.file_url.as_deref().unwrap_or("").is_empty() {
                    return Err(AppError::bad_request(
                        "file_url is required for file_upload and url submissions",
                    ));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GradeSubmissionDto {
    #[validate(length(min = 1))]
    pub grade: String,
    pub feedback: Option<String>,
}
