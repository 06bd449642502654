//! Tower middleware for the API server
//!
//! Request authentication lives in `chorely_shared::auth::middleware` and is
//! wired up in [`crate::app`].

pub mod security;
