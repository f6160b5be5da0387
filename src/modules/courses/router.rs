use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::controller::{
    add_chapter, create_course, enroll_student, get_course_details, get_my_course_details,
    list_chapters, list_courses, list_enrolled_students, list_my_courses, list_teaching_courses,
};
use crate::middleware::auth::authenticate;
use crate::middleware::role::{require_student, require_teacher};
use crate::modules::assignments::controller::{create_assignment, list_course_assignments};
use crate::state::AppState;

/// Course routes, grouped by access level and merged. Same-path routes
/// with different methods (e.g. GET vs POST `/{id}/chapters`) live in
/// different groups and keep their own layers.
pub fn init_courses_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_courses))
        .route("/{id}", get(get_course_details));

    let authenticated = Router::new()
        .route("/{id}/chapters", get(list_chapters))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    let student = Router::new()
        .route("/my-courses", get(list_my_courses))
        .route("/my-courses/{id}", get(get_my_course_details))
        .route("/{id}/assignments", get(list_course_assignments))
        .route_layer(middleware::from_fn(require_student))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    let teacher = Router::new()
        .route("/", post(create_course))
        .route("/teaching", get(list_teaching_courses))
        .route("/{id}/chapters", post(add_chapter))
        .route("/{id}/enrollments", post(enroll_student))
        .route("/{id}/students", get(list_enrolled_students))
        .route("/{id}/assignments", post(create_assignment))
        .route_layer(middleware::from_fn(require_teacher))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    public.merge(authenticated).merge(student).merge(teacher)
}
