use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::controller::{
    get_my_submission, grade_submission, list_submissions, submit_assignment,
};
use crate::middleware::auth::authenticate;
use crate::middleware::role::{require_student, require_teacher};
use crate::state::AppState;

/// Assignment routes. Creation and listing per course live under the
/// courses router; everything here is keyed by assignment or submission.
pub fn init_assignments_router(state: AppState) -> Router<AppState> {
    let student = Router::new()
        .route("/{id}/submissions", post(submit_assignment))
        .route("/{id}/submissions/me", get(get_my_submission))
        .route_layer(middleware::from_fn(require_student))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    let teacher = Router::new()
        .route("/{id}/submissions", get(list_submissions))
        .route("/submissions/{id}/grade", post(grade_submission))
        .route_layer(middleware::from_fn(require_teacher))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    student.merge(teacher)
}
