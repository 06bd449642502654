//! Session model
//!
//! Every issued bearer token carries the ID of a session row as its `jti`
//! claim. Signing out stamps `revoked_at`, which invalidates the token even
//! though its signature and expiry are still good.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE sessions (
//!     id UUID PRIMARY KEY,
//!     user_id BIGINT NOT NULL REFERENCES users(id),
//!     issued_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     revoked_at TIMESTAMPTZ
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A sign-in session bound to one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Session ID (token `jti`)
    pub id: Uuid,

    /// User the session belongs to
    pub user_id: i64,

    /// When the session was opened
    pub issued_at: DateTime<Utc>,

    /// When the session stops being accepted
    pub expires_at: DateTime<Utc>,

    /// When the session was revoked by sign-out
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Input for opening a session
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub user_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session still authenticates requests at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }

    /// Persists a new session
    pub async fn create<'e, E>(executor: E, data: NewSession) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, issued_at, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, issued_at, expires_at, revoked_at
            "#,
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(data.issued_at)
        .bind(data.expires_at)
        .fetch_one(executor)
        .await
    }

    /// Finds a session by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, issued_at, expires_at, revoked_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Revokes a session
    ///
    /// Returns true if an unrevoked session was found. Revoking twice is a
    /// no-op.
    pub async fn revoke<'e, E>(
        executor: E,
        id: Uuid,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET revoked_at = $2
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(id)
        .bind(revoked_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
