/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Sign-up, sign-in, sign-out, current user
/// - `families`: Creating, joining and viewing a family
/// - `chores`: Family chores, assignment and completion
/// - `completions`: Family completion history

pub mod auth;
pub mod chores;
pub mod completions;
pub mod families;
pub mod health;
