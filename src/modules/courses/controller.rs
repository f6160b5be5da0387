use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::courses::model::{
    Chapter, Course, CourseDetails, CreateChapterDto, CreateCourseDto, EnrollStudentDto,
    EnrollmentOutcome, EnrollmentResponse,
};
use crate::modules::courses::service::CourseService;
use crate::modules::users::model::User;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

/// List all courses (public)
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "List of courses", body = Vec<Course>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::list_courses(&state.db).await?;
    Ok(Json(courses))
}

/// Get a course with its chapters (public)
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = CourseDetails),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course_details(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<CourseDetails>, AppError> {
    let details = CourseService::get_course_with_chapters(&state.db, course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course not found"))?;
    Ok(Json(details))
}

/// List the courses the authenticated student is enrolled in
#[utoipa::path(
    get,
    path = "/courses/my-courses",
    responses(
        (status = 200, description = "Enrolled courses", body = Vec<Course>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - students only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_my_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::list_enrolled_courses(&state.db, auth_user.id).await?;
    Ok(Json(courses))
}

/// Get one enrolled course with chapters
#[utoipa::path(
    get,
    path = "/courses/my-courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course details", body = CourseDetails),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled in this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_my_course_details(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<CourseDetails>, AppError> {
    let details =
        CourseService::get_course_details_for_student(&state.db, auth_user.id, course_id).await?;

    match details {
        Some(details) => Ok(Json(details)),
        // Not enrolled, or no such course; tell those two apart here.
        None => {
            if CourseService::get_course(&state.db, course_id).await?.is_none() {
                Err(AppError::not_found("Course not found"))
            } else {
                Err(AppError::forbidden(
                    "Access denied: you are not enrolled in this course",
                ))
            }
        }
    }
}

/// List the courses taught by the authenticated teacher
#[utoipa::path(
    get,
    path = "/courses/teaching",
    responses(
        (status = 200, description = "Taught courses", body = Vec<Course>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_teaching_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = CourseService::list_teaching(&state.db, auth_user.id).await?;
    Ok(Json(courses))
}

/// Create a course
#[utoipa::path(
    post,
    path = "/courses",
    request_body = CreateCourseDto,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn create_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateCourseDto>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = CourseService::create_course(&state.db, auth_user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// List chapters of a course (owning teacher or enrolled student)
#[utoipa::path(
    get,
    path = "/courses/{id}/chapters",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Chapters ordered by position", body = Vec<Chapter>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled in this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_chapters(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Chapter>>, AppError> {
    let chapters =
        CourseService::list_chapters(&state.db, course_id, auth_user.id, auth_user.role).await?;
    Ok(Json(chapters))
}

/// Add a chapter to an owned course
#[utoipa::path(
    post,
    path = "/courses/{id}/chapters",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = CreateChapterDto,
    responses(
        (status = 201, description = "Chapter added", body = Chapter),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse),
        (status = 404, description = "Course not found or not yours", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state, dto))]
pub async fn add_chapter(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateChapterDto>,
) -> Result<(StatusCode, Json<Chapter>), AppError> {
    let chapter = CourseService::add_chapter(&state.db, course_id, auth_user.id, dto).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// Enroll a student into an owned course
#[utoipa::path(
    post,
    path = "/courses/{id}/enrollments",
    params(("id" = Uuid, Path, description = "Course ID")),
    request_body = EnrollStudentDto,
    responses(
        (status = 201, description = "Student enrolled", body = EnrollmentResponse),
        (status = 200, description = "Student was already enrolled", body = EnrollmentResponse),
        (status = 400, description = "Target user is not a student", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Course not found or not yours", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn enroll_student(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<EnrollStudentDto>,
) -> Result<Response, AppError> {
    let outcome =
        CourseService::enroll_student(&state.db, course_id, dto.student_id, auth_user.id).await?;

    let response = match outcome {
        EnrollmentOutcome::Enrolled(enrollment) => (
            StatusCode::CREATED,
            Json(EnrollmentResponse {
                message: "Student enrolled successfully".to_string(),
                enrollment: Some(enrollment),
            }),
        ),
        EnrollmentOutcome::AlreadyEnrolled => (
            StatusCode::OK,
            Json(EnrollmentResponse {
                message: "Student is already enrolled in this course".to_string(),
                enrollment: None,
            }),
        ),
    };

    Ok(response.into_response())
}

/// List students enrolled in an owned course
#[utoipa::path(
    get,
    path = "/courses/{id}/students",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled students", body = Vec<User>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse),
        (status = 404, description = "Course not found or not yours", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn list_enrolled_students(
    State(state): State<AppState>,
    Path(course_id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    let students =
        CourseService::list_enrolled_students(&state.db, course_id, auth_user.id).await?;
    Ok(Json(students))
}
