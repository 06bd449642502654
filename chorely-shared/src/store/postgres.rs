//! PostgreSQL store
//!
//! Single-statement operations run directly against the pool. Operations
//! that touch more than one row run in a transaction and lock the row whose
//! state they check (`SELECT ... FOR UPDATE`) before writing.
//!
//! # Example
//!
//! ```no_run
//! use chorely_shared::db::pool::{create_pool, DatabaseConfig};
//! use chorely_shared::store::{PgStore, Store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let store = PgStore::new(pool);
//! store.ping().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    chore::{Chore, ChoreChanges, ChoreStatus, NewChore},
    completion::{Completion, NewCompletion},
    family::{Family, NewFamily, JOIN_CODE_CONSTRAINT},
    session::{NewSession, Session},
    user::{NewUser, User},
};

/// Unique index guarding case-insensitive emails
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Checks whether an error is a unique violation on a specific constraint
fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, data: NewUser) -> StoreResult<User> {
        User::create(&self.pool, data).await.map_err(|err| {
            if is_unique_violation(&err, EMAIL_CONSTRAINT) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(err)
            }
        })
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_family_members(&self, family_id: i64) -> StoreResult<Vec<User>> {
        Ok(User::list_by_family(&self.pool, family_id).await?)
    }

    async fn insert_session(&self, data: NewSession) -> StoreResult<Session> {
        Ok(Session::create(&self.pool, data).await?)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(Session::find_by_id(&self.pool, id).await?)
    }

    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        Ok(Session::revoke(&self.pool, id, at).await?)
    }

    async fn join_code_exists(&self, join_code: &str) -> StoreResult<bool> {
        Ok(Family::join_code_exists(&self.pool, join_code).await?)
    }

    async fn create_family(&self, owner_id: i64, data: NewFamily) -> StoreResult<Family> {
        let mut tx = self.pool.begin().await?;

        let owner = User::lock_by_id(&mut *tx, owner_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "user",
                id: owner_id,
            })?;

        if owner.family_id.is_some() {
            return Err(StoreError::AlreadyInFamily(owner_id));
        }

        let family = Family::create(&mut *tx, data).await.map_err(|err| {
            if is_unique_violation(&err, JOIN_CODE_CONSTRAINT) {
                StoreError::DuplicateJoinCode
            } else {
                StoreError::Database(err)
            }
        })?;

        User::set_family(&mut *tx, owner_id, family.id).await?;

        tx.commit().await?;

        debug!(family_id = family.id, owner_id, "Family committed");
        Ok(family)
    }

    async fn find_family(&self, id: i64) -> StoreResult<Option<Family>> {
        Ok(Family::find_by_id(&self.pool, id).await?)
    }

    async fn find_family_by_join_code(&self, join_code: &str) -> StoreResult<Option<Family>> {
        Ok(Family::find_by_join_code(&self.pool, join_code).await?)
    }

    async fn add_family_member(&self, family_id: i64, user_id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let user = User::lock_by_id(&mut *tx, user_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "user",
                id: user_id,
            })?;

        if user.family_id.is_some() {
            return Err(StoreError::AlreadyInFamily(user_id));
        }

        User::set_family(&mut *tx, user_id, family_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_chore(&self, data: NewChore) -> StoreResult<Chore> {
        Ok(Chore::create(&self.pool, data).await?)
    }

    async fn find_chore(&self, family_id: i64, id: i64) -> StoreResult<Option<Chore>> {
        Ok(Chore::find_in_family(&self.pool, family_id, id).await?)
    }

    async fn update_chore(
        &self,
        family_id: i64,
        id: i64,
        changes: ChoreChanges,
    ) -> StoreResult<Option<Chore>> {
        Ok(Chore::update(&self.pool, family_id, id, changes).await?)
    }

    async fn assign_chore(
        &self,
        family_id: i64,
        id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Chore>> {
        Ok(Chore::assign(&self.pool, family_id, id, user_id).await?)
    }

    async fn delete_chore(&self, family_id: i64, id: i64) -> StoreResult<bool> {
        Ok(Chore::delete(&self.pool, family_id, id).await?)
    }

    async fn list_chores(&self, family_id: i64) -> StoreResult<Vec<Chore>> {
        Ok(Chore::list_by_family(&self.pool, family_id).await?)
    }

    async fn append_completion(&self, data: NewCompletion) -> StoreResult<Completion> {
        let mut tx = self.pool.begin().await?;

        // Lock the chore so its points and assignee cannot change under us
        let chore = Chore::lock_in_family(&mut *tx, data.family_id, data.chore_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "chore",
                id: data.chore_id,
            })?;

        match chore.status() {
            ChoreStatus::Assigned(_) => {}
            ChoreStatus::Unassigned if data.claim_if_unassigned => {
                Chore::assign(&mut *tx, data.family_id, chore.id, data.user_id).await?;
            }
            ChoreStatus::Unassigned => return Err(StoreError::Unassigned(chore.id)),
        }

        let user = User::lock_by_id(&mut *tx, data.user_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "user",
                id: data.user_id,
            })?;
        if user.points.checked_add(chore.points).is_none() {
            return Err(StoreError::PointsOverflow(user.id));
        }

        let completion = Completion::create(&mut *tx, &data).await?;
        Chore::mark_completed(&mut *tx, chore.id, data.completed_at).await?;
        User::add_points(&mut *tx, user.id, chore.points).await?;

        tx.commit().await?;
        Ok(completion)
    }

    async fn list_completions(&self, family_id: i64) -> StoreResult<Vec<Completion>> {
        Ok(Completion::list_by_family(&self.pool, family_id).await?)
    }
}
