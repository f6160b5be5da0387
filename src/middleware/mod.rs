//! Middleware for request processing.
//!
//! - [`auth`]: Bearer token verification and the [`auth::AuthUser`] extractor
//! - [`role`]: Role gates layered after authentication
//!
//! # Request pipeline
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. The [`auth::authenticate`] layer verifies the token, resolves the
//!    user and stores an [`auth::AuthUser`] in request extensions
//! 3. A role layer ([`role::require_teacher`] / [`role::require_student`])
//!    rejects identities outside the required role set
//! 4. The handler runs, reading the identity through the `AuthUser`
//!    extractor
//!
//! Role layers must be composed inside an `authenticate` layer; a role
//! layer that finds no resolved identity fails the request with 500
//! rather than 403, so a misconfigured router is caught on first use.

pub mod auth;
pub mod role;
