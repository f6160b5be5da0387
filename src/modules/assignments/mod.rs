//! Assignment module.
//!
//! Assignments and submissions. Each (assignment, student) pair moves
//! through unsubmitted → submitted → graded, never backwards: a second
//! submission is a conflict and grading may repeat, overwriting the
//! previous grade.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;
