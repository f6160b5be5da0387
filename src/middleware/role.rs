//! Role-based authorization layers.
//!
//! These layers read the identity resolved by
//! [`crate::middleware::auth::authenticate`] and reject requests whose
//! role is outside the required set. They carry no state of their own and
//! never touch the database.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::Role;
use crate::utils::errors::AppError;

async fn require_roles(
    req: Request,
    next: Next,
    allowed_roles: &[Role],
) -> Result<Response, AppError> {
    // A role layer without a preceding authenticate layer is a router
    // misconfiguration, not an authorization failure.
    let user = req.extensions().get::<AuthUser>().ok_or_else(|| {
        AppError::internal(anyhow::anyhow!(
            "Role check reached without an authenticated identity; \
             the authenticate layer must run before any role layer"
        ))
    })?;

    if !allowed_roles.contains(&user.role) {
        return Err(AppError::forbidden(format!(
            "Access denied: your role ('{}') is not authorized for this resource",
            user.role
        )));
    }

    Ok(next.run(req).await)
}

/// Layer for teacher-only route groups.
pub async fn require_teacher(req: Request, next: Next) -> Result<Response, AppError> {
    require_roles(req, next, &[Role::Teacher]).await
}

/// Layer for student-only route groups.
pub async fn require_student(req: Request, next: Next) -> Result<Response, AppError> {
    require_roles(req, next, &[Role::Student]).await
}
