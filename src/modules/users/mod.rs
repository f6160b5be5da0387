//! User module.
//!
//! Profile reads and updates for the authenticated user, plus the core
//! [`model::User`] entity and [`model::Role`] sum type shared by every
//! other module.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
