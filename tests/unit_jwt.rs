use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use syllabyte::config::jwt::JwtConfig;
use syllabyte::modules::auth::model::Claims;
use syllabyte::modules::users::model::Role;
use syllabyte::utils::jwt::{create_access_token, verify_token};

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

#[test]
fn test_create_and_verify_round_trip() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, Role::Student, &jwt_config).unwrap();
    assert!(!token.is_empty());

    let claims = verify_token(&token, &jwt_config).unwrap();
    assert_eq!(claims.user_id, user_id);
    assert_eq!(claims.role, Role::Student);
}

#[test]
fn test_token_carries_role_snapshot() {
    let jwt_config = get_test_jwt_config();

    for role in [Role::Student, Role::Teacher] {
        let token = create_access_token(Uuid::new_v4(), role, &jwt_config).unwrap();
        let claims = verify_token(&token, &jwt_config).unwrap();
        assert_eq!(claims.role, role);
    }
}

#[test]
fn test_token_expiry_is_config_lifetime() {
    let jwt_config = get_test_jwt_config();

    let token = create_access_token(Uuid::new_v4(), Role::Teacher, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert!(claims.exp > claims.iat);
    assert_eq!(
        claims.exp - claims.iat,
        jwt_config.access_token_expiry as usize
    );
}

#[test]
fn test_verify_rejects_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), Role::Student, &jwt_config).unwrap();

    let wrong_config = JwtConfig {
        secret: "a_completely_different_secret".to_string(),
        access_token_expiry: 3600,
    };

    assert!(verify_token(&token, &wrong_config).is_err());
}

#[test]
fn test_verify_rejects_expired_token() {
    let jwt_config = get_test_jwt_config();
    let now = chrono::Utc::now().timestamp() as usize;

    let claims = Claims {
        user_id: Uuid::new_v4(),
        role: Role::Student,
        iat: now - 7200,
        exp: now - 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .unwrap();

    assert!(verify_token(&token, &jwt_config).is_err());
}

#[test]
fn test_verify_rejects_malformed_tokens() {
    let jwt_config = get_test_jwt_config();

    let malformed = [
        "",
        "not.a.token",
        "too.many.parts.here.extra",
        "!!!.invalid.chars",
        "header.payload.",
        ".payload.signature",
    ];

    for token in malformed {
        assert!(verify_token(token, &jwt_config).is_err(), "{:?}", token);
    }
}

#[test]
fn test_tampered_token_fails_verification() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), Role::Student, &jwt_config).unwrap();

    // Flip part of the payload; the signature no longer matches.
    let mut parts: Vec<&str> = token.split('.').collect();
    let tampered_payload = parts[1].replace(|c: char| c.is_ascii_lowercase(), "A");
    parts[1] = &tampered_payload;
    let tampered = parts.join(".");

    assert!(verify_token(&tampered, &jwt_config).is_err());
}

#[test]
fn test_different_users_get_different_tokens() {
    let jwt_config = get_test_jwt_config();

    let token_a = create_access_token(Uuid::new_v4(), Role::Student, &jwt_config).unwrap();
    let token_b = create_access_token(Uuid::new_v4(), Role::Student, &jwt_config).unwrap();

    assert_ne!(token_a, token_b);
}
