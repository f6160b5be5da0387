use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::assignments::model::{
    Assignment, CreateAssignmentDto, GradeSubmissionDto, Submission, SubmissionType,
    SubmitAssignmentDto,
};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{LoginRequest, LoginResponse, RegisterRequestDto};
use crate::modules::courses::model::{
    Chapter, Course, CourseDetails, CreateChapterDto, CreateCourseDto, EnrollStudentDto,
    Enrollment, EnrollmentResponse,
};
use crate::modules::users::model::{Role, UpdateProfileDto, User};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::users::controller::get_profile,
        crate::modules::users::controller::update_profile,
        crate::modules::courses::controller::list_courses,
        crate::modules::courses::controller::get_course_details,
        crate::modules::courses::controller::list_my_courses,
        crate::modules::courses::controller::get_my_course_details,
        crate::modules::courses::controller::list_teaching_courses,
        crate::modules::courses::controller::create_course,
        crate::modules::courses::controller::list_chapters,
        crate::modules::courses::controller::add_chapter,
        crate::modules::courses::controller::enroll_student,
        crate::modules::courses::controller::list_enrolled_students,
        crate::modules::assignments::controller::list_course_assignments,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::submit_assignment,
        crate::modules::assignments::controller::get_my_submission,
        crate::modules::assignments::controller::list_submissions,
        crate::modules::assignments::controller::grade_submission,
    ),
    components(
        schemas(
            User,
            Role,
            RegisterRequestDto,
            LoginRequest,
            LoginResponse,
            UpdateProfileDto,
            Course,
            CourseDetails,
            CreateCourseDto,
            Chapter,
            CreateChapterDto,
            Enrollment,
            EnrollStudentDto,
            EnrollmentResponse,
            Assignment,
            CreateAssignmentDto,
            Submission,
            SubmissionType,
            SubmitAssignmentDto,
            GradeSubmissionDto,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "Users", description = "Profile management"),
        (name = "Courses", description = "Courses, chapters, and enrollments"),
        (name = "Assignments", description = "Assignments, submissions, and grading")
    ),
    info(
        title = "Syllabyte API",
        version = "0.1.0",
        description = "A course-management REST API built with Rust, Axum, and PostgreSQL featuring JWT-based authentication.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
