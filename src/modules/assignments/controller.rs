use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::assignments::model::{
    Assignment, CreateAssignmentDto, GradeSubmissionDto, Submission, SubmitAssignmentDto,
};
use crate::modules::assignments::service::AssignmentService;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

/// List assignments of a course the student is enrolled in
#[utoipa::path(
    get,
    path = "/courses/{id}/assignments",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Assignments, due date ascending (no due date last)", body = Vec<Assignment>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled in this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state))]
pub async fn list_course_assignments(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Assignment>>, AppError> {
    let assignments =
        AssignmentService::list_for_course(&state.db, course_id, auth_user.id).await?;
    Ok(Json(assignments))
}

/// Create an assignment in an owned course
#[utoipa::path(
    post,
    path = "/courses/{id}/assignments",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateAssignmentDto,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 400, description = "Bad request - validation error or foreign chapter", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Course not found or not yours", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state, dto))]
pub async fn create_assignment(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let assignment =
        AssignmentService::create_for_course(&state.db, auth_user.id, course_id, dto).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Submit an assignment
#[utoipa::path(
    post,
    path = "/assignments/{id}/submissions",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    request_body = SubmitAssignmentDto,
    responses(
        (status = 201, description = "Submission stored", body = Submission),
        (status = 400, description = "Bad request - content missing for type", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled in the assignment's course", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Already submitted", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state, dto))]
pub async fn submit_assignment(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SubmitAssignmentDto>,
) -> Result<(StatusCode, Json<Submission>), AppError> {
    // Boundary check; the service repeats it.
    dto.check_content()?;

    let submission =
        AssignmentService::submit(&state.db, auth_user.id, assignment_id, dto).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

/// Get the authenticated student's own submission
#[utoipa::path(
    get,
    path = "/assignments/{id}/submissions/me",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "The student's submission", body = Submission),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled in the assignment's course", body = ErrorResponse),
        (status = 404, description = "Assignment or submission not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state))]
pub async fn get_my_submission(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<Submission>, AppError> {
    let submission = AssignmentService::get_own_submission(&state.db, auth_user.id, assignment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Submission not found for this assignment"))?;
    Ok(Json(submission))
}

/// List all submissions of an owned assignment
#[utoipa::path(
    get,
    path = "/assignments/{id}/submissions",
    params(("id" = Uuid, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Submissions, oldest first", body = Vec<Submission>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Assignment belongs to another teacher", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state))]
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Submission>>, AppError> {
    let submissions =
        AssignmentService::list_submissions(&state.db, auth_user.id, assignment_id).await?;
    Ok(Json(submissions))
}

/// Grade a submission
#[utoipa::path(
    post,
    path = "/assignments/submissions/{id}/grade",
    params(("id" = Uuid, Path, description = "Submission ID")),
    request_body = GradeSubmissionDto,
    responses(
        (status = 200, description = "Submission graded", body = Submission),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Submission belongs to another teacher's course", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Assignments"
)]
#[instrument(skip(state, dto))]
pub async fn grade_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<GradeSubmissionDto>,
) -> Result<Json<Submission>, AppError> {
    let submission =
        AssignmentService::grade(&state.db, auth_user.id, submission_id, dto).await?;
    Ok(Json(submission))
}
