//! Database models for Chorely
//!
//! Each model owns its SQL. Functions are generic over [`sqlx::PgExecutor`]
//! so the PostgreSQL store can run them either directly against the pool or
//! inside a transaction.
//!
//! # Models
//!
//! - `user`: User accounts, points, and family membership
//! - `session`: Revocable sign-in sessions backing bearer tokens
//! - `family`: Households and their join codes
//! - `chore`: Family-scoped recurring chores
//! - `completion`: Append-only chore completion events

pub mod chore;
pub mod completion;
pub mod family;
pub mod session;
pub mod user;
