//! # Chorely Shared Library
//!
//! This crate contains the domain types, storage layer, and business logic
//! behind the Chorely household chore tracker. The HTTP server in
//! `chorely-api` is a thin layer over the services defined here.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Storage abstraction with PostgreSQL and in-memory backends
//! - `db`: Connection pooling and migrations for the PostgreSQL backend
//! - `auth`: Password hashing, session tokens, join codes, request authentication
//! - `services`: Identity, family, chore, and completion services
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Chorely shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
