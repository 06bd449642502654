//! In-memory store
//!
//! All state lives behind a single async mutex, so every trait method is
//! atomic with respect to every other. Used by the test suites and by
//! `CHORELY_STORAGE=memory` for local runs without PostgreSQL.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    chore::{Chore, ChoreChanges, ChoreStatus, NewChore},
    completion::{Completion, NewCompletion},
    family::{Family, NewFamily},
    session::{NewSession, Session},
    user::{normalize_email, NewUser, User},
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, User>,
    families: BTreeMap<i64, Family>,
    chores: BTreeMap<i64, Chore>,
    sessions: HashMap<Uuid, Session>,
    completions: Vec<Completion>,
    next_user_id: i64,
    next_family_id: i64,
    next_chore_id: i64,
    next_completion_id: i64,
}

/// Returns the next value of an ID sequence (starting at 1)
fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl State {
    fn user_mut(&mut self, id: i64) -> StoreResult<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "user", id })
    }

    fn chore_in_family_mut(&mut self, family_id: i64, id: i64) -> Option<&mut Chore> {
        self.chores
            .get_mut(&id)
            .filter(|chore| chore.family_id == family_id)
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, data: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;

        let email = normalize_email(&data.email);
        if state.users.values().any(|user| user.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: next_id(&mut state.next_user_id),
            email,
            name: data.name,
            password_hash: data.password_hash,
            points: 0,
            family_id: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let state = self.state.lock().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn list_family_members(&self, family_id: i64) -> StoreResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|user| user.family_id == Some(family_id))
            .cloned()
            .collect())
    }

    async fn insert_session(&self, data: NewSession) -> StoreResult<Session> {
        let session = Session {
            id: data.id,
            user_id: data.user_id,
            issued_at: data.issued_at,
            expires_at: data.expires_at,
            revoked_at: None,
        };
        self.state
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(self.state.lock().await.sessions.get(&id).cloned())
    }

    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(&id) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn join_code_exists(&self, join_code: &str) -> StoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .families
            .values()
            .any(|family| family.join_code == join_code))
    }

    async fn create_family(&self, owner_id: i64, data: NewFamily) -> StoreResult<Family> {
        let mut state = self.state.lock().await;

        if state.user_mut(owner_id)?.family_id.is_some() {
            return Err(StoreError::AlreadyInFamily(owner_id));
        }
        if state
            .families
            .values()
            .any(|family| family.join_code == data.join_code)
        {
            return Err(StoreError::DuplicateJoinCode);
        }

        let now = Utc::now();
        let family = Family {
            id: next_id(&mut state.next_family_id),
            name: data.name,
            join_code: data.join_code,
            created_at: now,
        };
        state.families.insert(family.id, family.clone());

        let owner = state.user_mut(owner_id)?;
        owner.family_id = Some(family.id);
        owner.updated_at = now;

        Ok(family)
    }

    async fn find_family(&self, id: i64) -> StoreResult<Option<Family>> {
        Ok(self.state.lock().await.families.get(&id).cloned())
    }

    async fn find_family_by_join_code(&self, join_code: &str) -> StoreResult<Option<Family>> {
        let state = self.state.lock().await;
        Ok(state
            .families
            .values()
            .find(|family| family.join_code == join_code)
            .cloned())
    }

    async fn add_family_member(&self, family_id: i64, user_id: i64) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if !state.families.contains_key(&family_id) {
            return Err(StoreError::NotFound {
                entity: "family",
                id: family_id,
            });
        }

        let user = state.user_mut(user_id)?;
        if user.family_id.is_some() {
            return Err(StoreError::AlreadyInFamily(user_id));
        }
        user.family_id = Some(family_id);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_chore(&self, data: NewChore) -> StoreResult<Chore> {
        let mut state = self.state.lock().await;

        let now = Utc::now();
        let chore = Chore {
            id: next_id(&mut state.next_chore_id),
            name: data.name,
            description: data.description,
            points: data.points,
            frequency: data.frequency,
            assigned_to_user_id: None,
            last_completed_at: None,
            created_at: now,
            updated_at: now,
            family_id: data.family_id,
        };
        state.chores.insert(chore.id, chore.clone());
        Ok(chore)
    }

    async fn find_chore(&self, family_id: i64, id: i64) -> StoreResult<Option<Chore>> {
        let state = self.state.lock().await;
        Ok(state
            .chores
            .get(&id)
            .filter(|chore| chore.family_id == family_id)
            .cloned())
    }

    async fn update_chore(
        &self,
        family_id: i64,
        id: i64,
        changes: ChoreChanges,
    ) -> StoreResult<Option<Chore>> {
        let mut state = self.state.lock().await;
        Ok(state.chore_in_family_mut(family_id, id).map(|chore| {
            changes.apply_to(chore);
            chore.updated_at = Utc::now();
            chore.clone()
        }))
    }

    async fn assign_chore(
        &self,
        family_id: i64,
        id: i64,
        user_id: i64,
    ) -> StoreResult<Option<Chore>> {
        let mut state = self.state.lock().await;
        Ok(state.chore_in_family_mut(family_id, id).map(|chore| {
            chore.assigned_to_user_id = Some(user_id);
            chore.updated_at = Utc::now();
            chore.clone()
        }))
    }

    async fn delete_chore(&self, family_id: i64, id: i64) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        if state.chore_in_family_mut(family_id, id).is_none() {
            return Ok(false);
        }
        Ok(state.chores.remove(&id).is_some())
    }

    async fn list_chores(&self, family_id: i64) -> StoreResult<Vec<Chore>> {
        let state = self.state.lock().await;
        Ok(state
            .chores
            .values()
            .filter(|chore| chore.family_id == family_id)
            .cloned()
            .collect())
    }

    async fn append_completion(&self, data: NewCompletion) -> StoreResult<Completion> {
        let mut state = self.state.lock().await;

        // Validate everything before the first write so a failure leaves no trace
        let current_points = state
            .users
            .get(&data.user_id)
            .map(|user| user.points)
            .ok_or(StoreError::NotFound {
                entity: "user",
                id: data.user_id,
            })?;

        let chore = state
            .chore_in_family_mut(data.family_id, data.chore_id)
            .ok_or(StoreError::NotFound {
                entity: "chore",
                id: data.chore_id,
            })?;

        let claim = match chore.status() {
            ChoreStatus::Assigned(_) => false,
            ChoreStatus::Unassigned if data.claim_if_unassigned => true,
            ChoreStatus::Unassigned => return Err(StoreError::Unassigned(chore.id)),
        };

        let new_points = current_points
            .checked_add(chore.points)
            .ok_or(StoreError::PointsOverflow(data.user_id))?;

        if claim {
            chore.assigned_to_user_id = Some(data.user_id);
        }
        chore.last_completed_at = Some(data.completed_at);
        chore.updated_at = Utc::now();

        let completion = Completion {
            id: next_id(&mut state.next_completion_id),
            chore_id: data.chore_id,
            user_id: data.user_id,
            family_id: data.family_id,
            completed_at: data.completed_at,
        };
        state.completions.push(completion.clone());

        let user = state.user_mut(data.user_id)?;
        user.points = new_points;
        user.updated_at = Utc::now();

        Ok(completion)
    }

    async fn list_completions(&self, family_id: i64) -> StoreResult<Vec<Completion>> {
        let state = self.state.lock().await;
        let mut completions: Vec<Completion> = state
            .completions
            .iter()
            .filter(|completion| completion.family_id == family_id)
            .cloned()
            .collect();
        completions.sort_by(|a, b| {
            b.completed_at
                .cmp(&a.completed_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(completions)
    }
}
