//! User model and database operations
//!
//! Users belong to at most one family. The `family_id` column is only ever
//! written by the create-family and join-family flows, and `points` only by
//! completion events.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id BIGSERIAL PRIMARY KEY,
//!     email VARCHAR(255) NOT NULL,
//!     name VARCHAR(100) NOT NULL,
//!     password_hash VARCHAR(255) NOT NULL,
//!     points BIGINT NOT NULL DEFAULT 0 CHECK (points >= 0),
//!     family_id BIGINT REFERENCES families(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! CREATE UNIQUE INDEX users_email_key ON users (LOWER(email));
//! ```
//!
//! # Example
//!
//! ```no_run
//! use chorely_shared::models::user::{User, NewUser};
//! use chorely_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let user = User::create(&pool, NewUser {
//!     email: "user@example.com".to_string(),
//!     name: "Test User".to_string(),
//!     password_hash: "$argon2id$...".to_string(),
//! }).await?;
//!
//! let found = User::find_by_email(&pool, "USER@example.com").await?;
//! assert_eq!(found.map(|u| u.id), Some(user.id));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, points, family_id, created_at, updated_at";

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: i64,

    /// Email address, stored lowercase
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Cumulative points earned from completed chores
    pub points: i64,

    /// Family this user belongs to, if any
    pub family_id: Option<i64>,

    /// When the user account was created
    pub created_at: DateTime<Utc>,

    /// When the user account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address (already normalized to lowercase)
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Public view of a user, as returned by the auth endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub points: i64,
    pub family_id: Option<i64>,
}

/// Roster entry for a family member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub points: i64,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            points: user.points,
            family_id: user.family_id,
        }
    }
}

impl From<&User> for FamilyMember {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            points: user.points,
        }
    }
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user with zero points and no family
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered (unique index
    /// `users_email_key`) or the database is unreachable.
    pub async fn create<'e, E>(executor: E, data: NewUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.name)
            .bind(data.password_hash)
            .fetch_one(executor)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by ID and locks the row until the transaction ends
    ///
    /// Used to serialize family membership changes for one user.
    pub async fn lock_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {} FROM users WHERE id = $1 FOR UPDATE", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email<'e, E>(
        executor: E,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Lists members of a family, ordered by user ID
    pub async fn list_by_family<'e, E>(
        executor: E,
        family_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {} FROM users WHERE family_id = $1 ORDER BY id ASC",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(family_id)
            .fetch_all(executor)
            .await
    }

    /// Sets the user's family reference
    ///
    /// Returns true if the user was found and updated.
    pub async fn set_family<'e, E>(
        executor: E,
        id: i64,
        family_id: i64,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET family_id = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(family_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Adds points to a user's running total
    pub async fn add_points<'e, E>(executor: E, id: i64, points: i64) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET points = points + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(points)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
