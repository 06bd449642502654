//! Completion model (append-only)
//!
//! A completion records that a user finished a chore at a point in time.
//! Rows are never updated or deleted. `chore_id` is not a foreign key so
//! history survives chore deletion; `family_id` is copied from the chore at
//! record time and scopes the activity feed.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE completions (
//!     id BIGSERIAL PRIMARY KEY,
//!     chore_id BIGINT NOT NULL,
//!     user_id BIGINT NOT NULL REFERENCES users(id),
//!     family_id BIGINT NOT NULL REFERENCES families(id),
//!     completed_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX completions_family_completed_idx
//!     ON completions (family_id, completed_at DESC);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Completion event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Completion {
    pub id: i64,

    /// Chore that was completed (may since have been deleted)
    pub chore_id: i64,

    /// User who completed it
    pub user_id: i64,

    /// Family the chore belonged to
    #[serde(skip)]
    pub family_id: i64,

    pub completed_at: DateTime<Utc>,
}

/// Input for appending a completion
///
/// The store performs the insert, the chore's `last_completed_at` update, and
/// the completer's point increment as one atomic unit.
#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub chore_id: i64,
    pub family_id: i64,
    pub user_id: i64,
    pub completed_at: DateTime<Utc>,

    /// Assign the chore to the completer if nobody holds it. When false an
    /// unassigned chore is rejected.
    pub claim_if_unassigned: bool,
}

impl Completion {
    /// Appends a completion row
    pub async fn create<'e, E>(executor: E, data: &NewCompletion) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Completion>(
            r#"
            INSERT INTO completions (chore_id, user_id, family_id, completed_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, chore_id, user_id, family_id, completed_at
            "#,
        )
        .bind(data.chore_id)
        .bind(data.user_id)
        .bind(data.family_id)
        .bind(data.completed_at)
        .fetch_one(executor)
        .await
    }

    /// Lists a family's completions, most recent first
    pub async fn list_by_family<'e, E>(
        executor: E,
        family_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Completion>(
            r#"
            SELECT id, chore_id, user_id, family_id, completed_at
            FROM completions
            WHERE family_id = $1
            ORDER BY completed_at DESC, id DESC
            "#,
        )
        .bind(family_id)
        .fetch_all(executor)
        .await
    }
}
