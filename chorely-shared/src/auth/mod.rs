//! Authentication primitives
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`token`]: signed session tokens
//! - [`join_code`]: family join code generation and normalization
//! - [`middleware`]: bearer-token request authentication for axum

pub mod join_code;
pub mod middleware;
pub mod password;
pub mod token;
