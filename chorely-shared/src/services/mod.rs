//! Domain services
//!
//! Each service receives an `Arc<dyn Store>` at construction and is cheap to
//! clone. Operations take the acting [`User`] as loaded by the access
//! gateway for the current request.
//!
//! - [`identity`]: registration, sign-in, session tokens
//! - [`family`]: families, join codes, rosters
//! - [`chore`]: family-scoped chores, assignment, completion
//! - [`completion`]: the append-only completion log

use crate::error::{DomainError, DomainResult};
use crate::models::user::User;

pub mod chore;
pub mod completion;
pub mod family;
pub mod identity;

pub use chore::{ChoreLedger, CompletionPolicy};
pub use completion::CompletionLog;
pub use family::FamilyRegistry;
pub use identity::{IdentityService, TokenSettings};

/// Family the actor belongs to, or an auth error if they have none
pub(crate) fn family_of(actor: &User) -> DomainResult<i64> {
    actor
        .family_id
        .ok_or_else(|| DomainError::Auth("user must belong to a family".to_string()))
}

/// Input with surrounding whitespace removed
pub(crate) fn trimmed(value: &str) -> String {
    value.trim().to_string()
}
