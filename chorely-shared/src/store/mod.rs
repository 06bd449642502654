//! Storage abstraction
//!
//! Services talk to persistence only through the [`Store`] trait. Two
//! implementations ship with the crate:
//!
//! - [`PgStore`]: PostgreSQL via sqlx, multi-statement operations run in a
//!   transaction with row locks
//! - [`MemoryStore`]: process-local state behind one async mutex, used by
//!   tests and by `CHORELY_STORAGE=memory`
//!
//! Operations that must be atomic as a unit (creating a family and setting
//! its owner, joining, appending a completion) are single trait methods, so
//! each backend can guarantee atomicity its own way.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    chore::{Chore, ChoreChanges, NewChore},
    completion::{Completion, NewCompletion},
    family::{Family, NewFamily},
    session::{NewSession, Session},
    user::{NewUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another account already uses this email
    #[error("email already registered")]
    DuplicateEmail,

    /// Join code collided with an existing family
    #[error("join code already in use")]
    DuplicateJoinCode,

    /// The user already has a family
    #[error("user {0} already belongs to a family")]
    AlreadyInFamily(i64),

    /// A referenced row does not exist (or is outside the caller's family)
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Completion rejected because the chore has no assignee
    #[error("chore {0} is not assigned")]
    Unassigned(i64),

    /// Crediting the completion would overflow the user's point total
    #[error("points total of user {0} would overflow")]
    PointsOverflow(i64),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence interface shared by every backend
#[async_trait]
pub trait Store: Send + Sync {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // ── Users ─────────────────────────────────────────────────────────────

    /// Inserts a user; fails with [`StoreError::DuplicateEmail`] on a
    /// case-insensitive email collision
    async fn insert_user(&self, data: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Members of a family ordered by user ID
    async fn list_family_members(&self, family_id: i64) -> StoreResult<Vec<User>>;

    // ── Sessions ──────────────────────────────────────────────────────────

    async fn insert_session(&self, data: NewSession) -> StoreResult<Session>;

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>>;

    /// Marks a session revoked; returns false if it was unknown or already
    /// revoked
    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool>;

    // ── Families ──────────────────────────────────────────────────────────

    async fn join_code_exists(&self, join_code: &str) -> StoreResult<bool>;

    /// Creates a family and makes `owner_id` its first member, atomically
    ///
    /// Fails with [`StoreError::AlreadyInFamily`] if the owner already has a
    /// family and [`StoreError::DuplicateJoinCode`] on a code collision.
    async fn create_family(&self, owner_id: i64, data: NewFamily) -> StoreResult<Family>;

    async fn find_family(&self, id: i64) -> StoreResult<Option<Family>>;

    async fn find_family_by_join_code(&self, join_code: &str) -> StoreResult<Option<Family>>;

    /// Sets the user's family; fails with [`StoreError::AlreadyInFamily`] if
    /// the user already has one
    async fn add_family_member(&self, family_id: i64, user_id: i64) -> StoreResult<()>;

    // ── Chores ────────────────────────────────────────────────────────────

    async fn insert_chore(&self, data: NewChore) -> StoreResult<Chore>;

    async fn find_chore(&self, family_id: i64, id: i64) -> StoreResult<Option<Chore>>;

    async fn update_chore(
        &self,
        family_id: i64,
        id: i64,
        changes: ChoreChanges,
    ) -> StoreResult<Option<Chore>>;

    async fn assign_chore(&self, family_id: i64, id: i64, user_id: i64)
        -> StoreResult<Option<Chore>>;

    async fn delete_chore(&self, family_id: i64, id: i64) -> StoreResult<bool>;

    /// A family's chores ordered by ID
    async fn list_chores(&self, family_id: i64) -> StoreResult<Vec<Chore>>;

    // ── Completions ───────────────────────────────────────────────────────

    /// Appends a completion, stamps the chore's `last_completed_at`, and
    /// credits the completer with the chore's points, all or nothing
    ///
    /// Fails with [`StoreError::NotFound`] if the chore is gone and
    /// [`StoreError::Unassigned`] if it has no assignee and
    /// `claim_if_unassigned` is false.
    async fn append_completion(&self, data: NewCompletion) -> StoreResult<Completion>;

    /// A family's completions, most recent first
    async fn list_completions(&self, family_id: i64) -> StoreResult<Vec<Completion>>;
}
