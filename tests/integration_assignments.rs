mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use common::{
    bearer_for, body_json, create_test_assignment, create_test_course, create_test_user,
    enroll_test_student, get_request, json_request, setup_test_app,
};
use syllabyte::modules::users::model::Role;

/// The whole lifecycle through the public API: register both users, create
/// the course, chapter and assignment, enroll, submit, reject the second
/// submission, grade, and read the grade back.
#[sqlx::test(migrations = "./migrations")]
async fn test_full_course_lifecycle(pool: PgPool) {
    let app = setup_test_app(pool.clone());

    // Register teacher and student.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "teacher_t",
                "email": "t@test.com",
                "password": "password123",
                "role": "teacher"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "username": "student_s",
                "email": "s@test.com",
                "password": "password123",
                "role": "student"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let student_body = body_json(response).await;
    let student_id = student_body["id"].as_str().unwrap().to_string();

    // Login both.
    let login = |username: &str| {
        json_request(
            "POST",
            "/auth/login",
            None,
            &json!({ "username_or_email": username, "password": "password123" }),
        )
    };
    let teacher_token = body_json(app.clone().oneshot(login("teacher_t")).await.unwrap()).await
        ["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let teacher_bearer = format!("Bearer {}", teacher_token);
    let student_token = body_json(app.clone().oneshot(login("student_s")).await.unwrap()).await
        ["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    let student_bearer = format!("Bearer {}", student_token);

    // Teacher creates course C with chapter and assignment.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/courses",
            Some(&teacher_bearer),
            &json!({ "title": "Course C" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let course_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/courses/{}/chapters", course_id),
            Some(&teacher_bearer),
            &json!({ "title": "Intro", "content": "Welcome", "order": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let due = (Utc::now() + Duration::days(1)).to_rfc3339();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/courses/{}/assignments", course_id),
            Some(&teacher_bearer),
            &json!({ "title": "Assignment A", "due_date": due }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let assignment_id = body_json(response).await["id"].as_str().unwrap().to_string();

    // Teacher enrolls student S.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/courses/{}/enrollments", course_id),
            Some(&teacher_bearer),
            &json!({ "student_id": student_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // S lists assignments and sees A.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/courses/{}/assignments", course_id),
            Some(&student_bearer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let assignments = body_json(response).await;
    assert_eq!(assignments.as_array().unwrap().len(), 1);
    assert_eq!(assignments[0]["title"], "Assignment A");

    // S submits; a second attempt conflicts.
    let submit = || {
        json_request(
            "POST",
            &format!("/assignments/{}/submissions", assignment_id),
            Some(&student_bearer),
            &json!({ "submission_type": "text", "content_text": "answer" }),
        )
    };
    let response = app.clone().oneshot(submit()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let submission_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app.clone().oneshot(submit()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // T sees exactly one submission, from S.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/assignments/{}/submissions", assignment_id),
            Some(&teacher_bearer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submissions = body_json(response).await;
    assert_eq!(submissions.as_array().unwrap().len(), 1);
    assert_eq!(submissions[0]["student_id"].as_str().unwrap(), student_id);

    // T grades it.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/assignments/submissions/{}/grade", submission_id),
            Some(&teacher_bearer),
            &json!({ "grade": "A", "feedback": "well done" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // S reads the grade back.
    let response = app
        .oneshot(get_request(
            &format!("/assignments/{}/submissions/me", assignment_id),
            Some(&student_bearer),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let submission = body_json(response).await;
    assert_eq!(submission["grade"], "A");
    assert_eq!(submission["feedback"], "well done");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_assignments_ordered_by_due_date_nulls_last(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let student = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Ordered").await;
    enroll_test_student(&pool, student.id, course_id).await;

    create_test_assignment(&pool, course_id, "No due date", None).await;
    create_test_assignment(
        &pool,
        course_id,
        "Due next week",
        Some(Utc::now() + Duration::days(7)),
    )
    .await;
    create_test_assignment(
        &pool,
        course_id,
        "Due tomorrow",
        Some(Utc::now() + Duration::days(1)),
    )
    .await;

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(get_request(
            &format!("/courses/{}/assignments", course_id),
            Some(&bearer_for(&student)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Due tomorrow", "Due next week", "No due date"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_assignments_requires_enrollment(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let outsider = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Private").await;

    let app = setup_test_app(pool.clone());

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/courses/{}/assignments", course_id),
            Some(&bearer_for(&outsider)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown course is a 404, not a 403.
    let response = app
        .oneshot(get_request(
            &format!("/courses/{}/assignments", Uuid::new_v4()),
            Some(&bearer_for(&outsider)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_assignment_foreign_chapter_rejected(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let course_id = create_test_course(&pool, teacher.id, "Course A").await;
    let other_course = create_test_course(&pool, teacher.id, "Course B").await;
    let foreign_chapter = common::create_test_chapter(&pool, other_course, "Foreign", 1).await;

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/courses/{}/assignments", course_id),
            Some(&bearer_for(&teacher)),
            &json!({ "title": "Cross-linked", "chapter_id": foreign_chapter }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_unknown_assignment_404(pool: PgPool) {
    let student = create_test_user(&pool, Role::Student).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/assignments/{}/submissions", Uuid::new_v4()),
            Some(&bearer_for(&student)),
            &json!({ "submission_type": "text", "content_text": "answer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_requires_enrollment(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let outsider = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Private").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/assignments/{}/submissions", assignment_id),
            Some(&bearer_for(&outsider)),
            &json!({ "submission_type": "text", "content_text": "answer" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_submit_content_required_by_type(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let student = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Course").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;
    enroll_test_student(&pool, student.id, course_id).await;

    let app = setup_test_app(pool.clone());
    let uri = format!("/assignments/{}/submissions", assignment_id);

    // text without content_text
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&bearer_for(&student)),
            &json!({ "submission_type": "text" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // url without file_url
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&bearer_for(&student)),
            &json!({ "submission_type": "url", "content_text": "not a url" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // file_upload with file_url is fine
    let response = app
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&bearer_for(&student)),
            &json!({ "submission_type": "file_upload", "file_url": "https://files.test/hw.pdf" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_double_submit_stores_exactly_one_row(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let student = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Course").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;
    enroll_test_student(&pool, student.id, course_id).await;

    let app = setup_test_app(pool.clone());
    let uri = format!("/assignments/{}/submissions", assignment_id);
    let body = json!({ "submission_type": "text", "content_text": "first" });

    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, Some(&bearer_for(&student)), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request("POST", &uri, Some(&bearer_for(&student)), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM submissions WHERE assignment_id = $1 AND student_id = $2",
    )
    .bind(assignment_id)
    .bind(student.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_submissions_non_owner_forbidden(pool: PgPool) {
    let owner = create_test_user(&pool, Role::Teacher).await;
    let other_teacher = create_test_user(&pool, Role::Teacher).await;
    let course_id = create_test_course(&pool, owner.id, "Course").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(get_request(
            &format!("/assignments/{}/submissions", assignment_id),
            Some(&bearer_for(&other_teacher)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_grade_unknown_submission_404(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let app = setup_test_app(pool.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/assignments/submissions/{}/grade", Uuid::new_v4()),
            Some(&bearer_for(&teacher)),
            &json!({ "grade": "A" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_grade_by_non_owner_forbidden(pool: PgPool) {
    let owner = create_test_user(&pool, Role::Teacher).await;
    let other_teacher = create_test_user(&pool, Role::Teacher).await;
    let student = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, owner.id, "Course").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;
    enroll_test_student(&pool, student.id, course_id).await;

    let submission_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO submissions (assignment_id, student_id, submission_type, content_text)
         VALUES ($1, $2, 'text', 'answer')
         RETURNING id",
    )
    .bind(assignment_id)
    .bind(student.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/assignments/submissions/{}/grade", submission_id),
            Some(&bearer_for(&other_teacher)),
            &json!({ "grade": "F" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_regrade_overwrites_previous_grade(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let student = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Course").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;
    enroll_test_student(&pool, student.id, course_id).await;

    let submission_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO submissions (assignment_id, student_id, submission_type, content_text)
         VALUES ($1, $2, 'text', 'answer')
         RETURNING id",
    )
    .bind(assignment_id)
    .bind(student.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    let app = setup_test_app(pool.clone());
    let uri = format!("/assignments/submissions/{}/grade", submission_id);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&bearer_for(&teacher)),
            &json!({ "grade": "B", "feedback": "decent" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&bearer_for(&teacher)),
            &json!({ "grade": "A" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["grade"], "A");
    // Feedback was overwritten along with the grade; no history is kept.
    assert_eq!(body["feedback"], serde_json::Value::Null);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_my_submission_before_submitting_404(pool: PgPool) {
    let teacher = create_test_user(&pool, Role::Teacher).await;
    let student = create_test_user(&pool, Role::Student).await;
    let course_id = create_test_course(&pool, teacher.id, "Course").await;
    let assignment_id = create_test_assignment(&pool, course_id, "A", None).await;
    enroll_test_student(&pool, student.id, course_id).await;

    let app = setup_test_app(pool.clone());
    let response = app
        .oneshot(get_request(
            &format!("/assignments/{}/submissions/me", assignment_id),
            Some(&bearer_for(&student)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
