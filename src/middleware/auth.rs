use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::modules::users::model::Role;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// The verified identity of the requesting user.
///
/// Produced by [`authenticate`] (or the extractor directly) from a valid
/// bearer token whose subject still resolves to a user row. Lives in
/// request extensions for the duration of a single request only.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: Uuid,
    role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by the authenticate layer on this request.
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Authorization header is missing"))?;

        let token = parse_bearer(auth_header)?;
        let claims = verify_token(token, &state.jwt_config)?;

        // The token may outlive the account; the subject must still exist.
        let identity = sqlx::query_as::<_, IdentityRow>("SELECT id, role FROM users WHERE id = $1")
            .bind(claims.user_id)
            .fetch_optional(&state.db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            id: identity.id,
            role: identity.role,
        })
    }
}

/// Extracts the token from a header of the exact form `Bearer <token>`.
///
/// Exactly two whitespace-separated parts, scheme matched
/// case-insensitively. Anything else is a 401.
fn parse_bearer(header_value: &str) -> Result<&str, AppError> {
    let mut parts = header_value.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => {
            return Err(AppError::unauthorized(
                "Invalid authorization header format, expected \"Bearer <token>\"",
            ));
        }
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::unauthorized(
            "Invalid authorization header format, expected \"Bearer <token>\"",
        ));
    }

    if token.is_empty() {
        return Err(AppError::unauthorized("Token is missing"));
    }

    Ok(token)
}

/// Authentication layer for protected route groups.
///
/// Resolves the bearer token to an [`AuthUser`] and stores it in request
/// extensions so role layers and handlers share one verification.
pub async fn authenticate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &state).await?;
    parts.extensions.insert(user);

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_valid() {
        assert_eq!(parse_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_parse_bearer_scheme_case_insensitive() {
        assert_eq!(parse_bearer("bearer token123").unwrap(), "token123");
        assert_eq!(parse_bearer("BEARER token123").unwrap(), "token123");
    }

    #[test]
    fn test_parse_bearer_missing_token() {
        assert!(parse_bearer("Bearer").is_err());
        assert!(parse_bearer("Bearer ").is_err());
    }

    #[test]
    fn test_parse_bearer_wrong_scheme() {
        assert!(parse_bearer("Basic dXNlcjpwYXNz").is_err());
        assert!(parse_bearer("Token abc").is_err());
    }

    #[test]
    fn test_parse_bearer_too_many_parts() {
        assert!(parse_bearer("Bearer abc def").is_err());
    }

    #[test]
    fn test_parse_bearer_empty() {
        assert!(parse_bearer("").is_err());
    }
}
