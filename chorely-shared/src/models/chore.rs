//! Chore model and database operations
//!
//! Chores are reusable: completing one records an event and stamps
//! `last_completed_at`, but never ends the chore's life.
//!
//! # State Machine
//!
//! ```text
//! unassigned → assigned
//! assigned   → assigned   (reassign, last writer wins)
//! assigned   ─complete→ assigned (last_completed_at updated)
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE chores (
//!     id BIGSERIAL PRIMARY KEY,
//!     family_id BIGINT NOT NULL REFERENCES families(id),
//!     name VARCHAR(255) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     points BIGINT NOT NULL CHECK (points > 0),
//!     frequency VARCHAR(50) NOT NULL,
//!     assigned_to_user_id BIGINT REFERENCES users(id),
//!     last_completed_at TIMESTAMPTZ,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::fmt;

const CHORE_COLUMNS: &str = "id, family_id, name, description, points, frequency, \
     assigned_to_user_id, last_completed_at, created_at, updated_at";

/// How often a chore is expected to be done
///
/// Stored and echoed back as a plain string. Values other than `daily` and
/// `weekly` are kept verbatim; nothing is scheduled from this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Other(String),
}

impl Frequency {
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Other(value) => value,
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Daily
    }
}

impl From<String> for Frequency {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "daily" => Frequency::Daily,
            "weekly" => Frequency::Weekly,
            _ => Frequency::Other(value.trim().to_string()),
        }
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        match value {
            Frequency::Other(value) => value,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment state of a chore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoreStatus {
    Unassigned,
    Assigned(i64),
}

/// Chore model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Chore {
    /// Unique chore ID
    pub id: i64,

    /// Chore name
    pub name: String,

    /// Free-text description
    pub description: String,

    /// Points awarded per completion (always > 0)
    pub points: i64,

    /// Expected cadence
    #[sqlx(try_from = "String")]
    pub frequency: Frequency,

    /// Family member responsible for the chore
    pub assigned_to_user_id: Option<i64>,

    /// Time of the most recent completion
    pub last_completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Owning family; never changes after creation
    pub family_id: i64,
}

impl Chore {
    pub fn status(&self) -> ChoreStatus {
        match self.assigned_to_user_id {
            Some(user_id) => ChoreStatus::Assigned(user_id),
            None => ChoreStatus::Unassigned,
        }
    }
}

/// Input for creating a chore
#[derive(Debug, Clone)]
pub struct NewChore {
    pub family_id: i64,
    pub name: String,
    pub description: String,
    pub points: i64,
    pub frequency: Frequency,
}

/// Partial update for a chore
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoreChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub points: Option<i64>,
    pub frequency: Option<Frequency>,
}

impl ChoreChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.points.is_none()
            && self.frequency.is_none()
    }

    /// Applies the changes to an in-memory chore
    pub fn apply_to(&self, chore: &mut Chore) {
        if let Some(name) = &self.name {
            chore.name = name.clone();
        }
        if let Some(description) = &self.description {
            chore.description = description.clone();
        }
        if let Some(points) = self.points {
            chore.points = points;
        }
        if let Some(frequency) = &self.frequency {
            chore.frequency = frequency.clone();
        }
    }
}

impl Chore {
    /// Inserts a new, unassigned chore
    pub async fn create<'e, E>(executor: E, data: NewChore) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO chores (family_id, name, description, points, frequency) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            CHORE_COLUMNS
        );

        sqlx::query_as::<_, Chore>(&query)
            .bind(data.family_id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.points)
            .bind(data.frequency.as_str())
            .fetch_one(executor)
            .await
    }

    /// Finds a chore by ID within a family
    ///
    /// Chores of other families are indistinguishable from missing ones.
    pub async fn find_in_family<'e, E>(
        executor: E,
        family_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM chores WHERE id = $1 AND family_id = $2",
            CHORE_COLUMNS
        );

        sqlx::query_as::<_, Chore>(&query)
            .bind(id)
            .bind(family_id)
            .fetch_optional(executor)
            .await
    }

    /// Same as [`Chore::find_in_family`] but locks the row until the
    /// transaction ends
    pub async fn lock_in_family<'e, E>(
        executor: E,
        family_id: i64,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM chores WHERE id = $1 AND family_id = $2 FOR UPDATE",
            CHORE_COLUMNS
        );

        sqlx::query_as::<_, Chore>(&query)
            .bind(id)
            .bind(family_id)
            .fetch_optional(executor)
            .await
    }

    /// Lists a family's chores ordered by ID
    pub async fn list_by_family<'e, E>(
        executor: E,
        family_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM chores WHERE family_id = $1 ORDER BY id ASC",
            CHORE_COLUMNS
        );

        sqlx::query_as::<_, Chore>(&query)
            .bind(family_id)
            .fetch_all(executor)
            .await
    }

    /// Applies a partial update and bumps `updated_at`
    ///
    /// Returns None if the chore does not exist in the family.
    pub async fn update<'e, E>(
        executor: E,
        family_id: i64,
        id: i64,
        changes: ChoreChanges,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE chores SET \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 points = COALESCE($5, points), \
                 frequency = COALESCE($6, frequency), \
                 updated_at = NOW() \
             WHERE id = $1 AND family_id = $2 \
             RETURNING {}",
            CHORE_COLUMNS
        );

        sqlx::query_as::<_, Chore>(&query)
            .bind(id)
            .bind(family_id)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.points)
            .bind(changes.frequency.map(String::from))
            .fetch_optional(executor)
            .await
    }

    /// Sets the assignee and bumps `updated_at`
    pub async fn assign<'e, E>(
        executor: E,
        family_id: i64,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE chores SET assigned_to_user_id = $3, updated_at = NOW() \
             WHERE id = $1 AND family_id = $2 RETURNING {}",
            CHORE_COLUMNS
        );

        sqlx::query_as::<_, Chore>(&query)
            .bind(id)
            .bind(family_id)
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Stamps the most recent completion time
    pub async fn mark_completed<'e, E>(
        executor: E,
        id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE chores
            SET last_completed_at = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(completed_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a chore within a family
    ///
    /// Completion history is left untouched.
    pub async fn delete<'e, E>(executor: E, family_id: i64, id: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM chores WHERE id = $1 AND family_id = $2")
            .bind(id)
            .bind(family_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
