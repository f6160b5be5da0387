//! Authentication module: registration, login, and the token claims
//! shared with the middleware.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
