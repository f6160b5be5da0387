use axum::body::Body;
use axum::http::Request;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use syllabyte::config::cors::CorsConfig;
use syllabyte::config::jwt::JwtConfig;
use syllabyte::modules::users::model::Role;
use syllabyte::router::init_router;
use syllabyte::state::AppState;
use syllabyte::utils::jwt::create_access_token;
use syllabyte::utils::password::hash_password;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn setup_test_app(pool: PgPool) -> axum::Router {
    let state = AppState {
        db: pool,
        jwt_config: test_jwt_config(),
        cors_config: CorsConfig::from_env(),
    };
    init_router(state)
}

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> TestUser {
    let username = format!("user-{}", Uuid::new_v4().simple());
    let email = format!("{}@test.com", username);
    let password = "testpass123".to_string();
    let hashed = hash_password(&password).unwrap();

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (username, email, password_hash, role)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(&username)
    .bind(&email)
    .bind(&hashed)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        username,
        email,
        password,
        role,
    }
}

/// `Bearer <token>` header value for a fixture user.
#[allow(dead_code)]
pub fn bearer_for(user: &TestUser) -> String {
    let token = create_access_token(user.id, user.role, &test_jwt_config()).unwrap();
    format!("Bearer {}", token)
}

#[allow(dead_code)]
pub async fn create_test_course(pool: &PgPool, teacher_id: Uuid, title: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO courses (title, description, teacher_id)
         VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(title)
    .bind(Some("Test course description"))
    .bind(teacher_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn create_test_chapter(pool: &PgPool, course_id: Uuid, title: &str, order: i32) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO chapters (course_id, title, content, "order")
           VALUES ($1, $2, $3, $4)
           RETURNING id"#,
    )
    .bind(course_id)
    .bind(title)
    .bind("Test chapter content")
    .bind(order)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn create_test_assignment(
    pool: &PgPool,
    course_id: Uuid,
    title: &str,
    due_date: Option<DateTime<Utc>>,
) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO assignments (course_id, title, description, due_date)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(course_id)
    .bind(title)
    .bind(Some("Test assignment description"))
    .bind(due_date)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[allow(dead_code)]
pub async fn enroll_test_student(pool: &PgPool, student_id: Uuid, course_id: Uuid) {
    sqlx::query("INSERT INTO enrollments (student_id, course_id) VALUES ($1, $2)")
        .bind(student_id)
        .bind(course_id)
        .execute(pool)
        .await
        .unwrap();
}

#[allow(dead_code)]
pub fn get_request(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header("authorization", bearer);
    }
    builder.body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub fn json_request(
    method: &str,
    uri: &str,
    bearer: Option<&str>,
    body: &serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header("authorization", bearer);
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
