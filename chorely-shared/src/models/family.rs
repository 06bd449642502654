//! Family model and database operations
//!
//! A family is a household sharing chores. Members are not stored on the
//! family row; the roster is every user whose `family_id` points here.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE families (
//!     id BIGSERIAL PRIMARY KEY,
//!     name VARCHAR(100) NOT NULL,
//!     join_code VARCHAR(16) NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     CONSTRAINT families_join_code_key UNIQUE (join_code)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::user::{FamilyMember, User};

/// Unique constraint guarding join codes
pub const JOIN_CODE_CONSTRAINT: &str = "families_join_code_key";

/// Family model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Family {
    /// Unique family ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Shared code other users present to join; immutable once generated
    pub join_code: String,

    /// When the family was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a family
#[derive(Debug, Clone)]
pub struct NewFamily {
    pub name: String,
    pub join_code: String,
}

/// Family together with its member roster, as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRoster {
    pub id: i64,
    pub name: String,
    pub join_code: String,
    pub users: Vec<FamilyMember>,
}

impl FamilyRoster {
    /// Builds a roster view from a family and its members
    pub fn new(family: Family, members: &[User]) -> Self {
        Self {
            id: family.id,
            name: family.name,
            join_code: family.join_code,
            users: members.iter().map(FamilyMember::from).collect(),
        }
    }
}

impl Family {
    /// Inserts a new family
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on [`JOIN_CODE_CONSTRAINT`] if the join
    /// code is taken.
    pub async fn create<'e, E>(executor: E, data: NewFamily) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Family>(
            r#"
            INSERT INTO families (name, join_code)
            VALUES ($1, $2)
            RETURNING id, name, join_code, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.join_code)
        .fetch_one(executor)
        .await
    }

    /// Finds a family by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Family>(
            "SELECT id, name, join_code, created_at FROM families WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a family by its join code
    pub async fn find_by_join_code<'e, E>(
        executor: E,
        join_code: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Family>(
            "SELECT id, name, join_code, created_at FROM families WHERE join_code = $1",
        )
        .bind(join_code)
        .fetch_optional(executor)
        .await
    }

    /// Checks whether a join code has ever been issued
    pub async fn join_code_exists<'e, E>(executor: E, join_code: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM families WHERE join_code = $1)")
            .bind(join_code)
            .fetch_one(executor)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_shape() {
        let family = Family {
            id: 1,
            name: "Test Family".to_string(),
            join_code: "FAMILY123".to_string(),
            created_at: Utc::now(),
        };

        let roster = FamilyRoster::new(family, &[]);
        let json = serde_json::to_value(&roster).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "Test Family",
                "join_code": "FAMILY123",
                "users": [],
            })
        );
    }
}
