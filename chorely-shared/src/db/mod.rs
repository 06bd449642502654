//! PostgreSQL connection management
//!
//! - [`pool`]: connection pool construction and health checks
//! - [`migrations`]: embedded schema migrations

pub mod migrations;
pub mod pool;
