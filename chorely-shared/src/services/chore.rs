//! Chore ledger
//!
//! Every operation is scoped to the actor's family. A chore in another
//! family is reported as missing, never as forbidden, so IDs don't leak
//! across households.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use super::completion::CompletionLog;
use super::{family_of, trimmed};
use crate::error::{DomainError, DomainResult};
use crate::models::chore::{Chore, ChoreChanges, Frequency, NewChore};
use crate::models::completion::Completion;
use crate::models::user::User;
use crate::store::Store;

/// What happens when someone completes a chore nobody is assigned to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Reject with a conflict
    #[default]
    RequireAssignment,

    /// Assign the chore to the completer, then record the completion
    SelfClaim,
}

impl CompletionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionPolicy::RequireAssignment => "require_assignment",
            CompletionPolicy::SelfClaim => "self_claim",
        }
    }
}

impl fmt::Display for CompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "require_assignment" => Ok(CompletionPolicy::RequireAssignment),
            "self_claim" => Ok(CompletionPolicy::SelfClaim),
            other => Err(format!(
                "unknown completion policy '{}' (expected require_assignment or self_claim)",
                other
            )),
        }
    }
}

/// Upper bound on points per chore
pub const MAX_CHORE_POINTS: i64 = 1_000_000;

/// Longest accepted frequency label
pub const MAX_FREQUENCY_LENGTH: usize = 50;

/// Create-chore input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateChore {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, max = 1_000_000, message = "must be between 1 and 1000000"))]
    pub points: i64,

    /// Defaults to daily
    #[serde(default)]
    pub frequency: Option<Frequency>,
}

/// Partial update; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateChore {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 1_000_000, message = "must be between 1 and 1000000"))]
    pub points: Option<i64>,

    pub frequency: Option<Frequency>,
}

#[derive(Clone)]
pub struct ChoreLedger {
    store: Arc<dyn Store>,
    completions: CompletionLog,
    policy: CompletionPolicy,
}

impl ChoreLedger {
    pub fn new(store: Arc<dyn Store>, completions: CompletionLog, policy: CompletionPolicy) -> Self {
        Self {
            store,
            completions,
            policy,
        }
    }

    /// Creates an unassigned chore in the actor's family
    pub async fn create(&self, actor: &User, input: CreateChore) -> DomainResult<Chore> {
        let family_id = family_of(actor)?;

        let input = CreateChore {
            name: trimmed(&input.name),
            ..input
        };
        input.validate()?;
        check_frequency(input.frequency.as_ref())?;

        let chore = self
            .store
            .insert_chore(NewChore {
                family_id,
                name: input.name,
                description: input.description.unwrap_or_default(),
                points: input.points,
                frequency: input.frequency.unwrap_or_default(),
            })
            .await?;

        info!(chore_id = chore.id, family_id, user_id = actor.id, "Chore created");
        Ok(chore)
    }

    pub async fn get(&self, actor: &User, chore_id: i64) -> DomainResult<Chore> {
        let family_id = family_of(actor)?;
        self.store
            .find_chore(family_id, chore_id)
            .await?
            .ok_or_else(chore_not_found)
    }

    /// Applies the provided fields and bumps `updated_at`
    pub async fn update(
        &self,
        actor: &User,
        chore_id: i64,
        input: UpdateChore,
    ) -> DomainResult<Chore> {
        let family_id = family_of(actor)?;

        let input = UpdateChore {
            name: input.name.as_deref().map(trimmed),
            ..input
        };
        input.validate()?;
        check_frequency(input.frequency.as_ref())?;

        let changes = ChoreChanges {
            name: input.name,
            description: input.description,
            points: input.points,
            frequency: input.frequency,
        };

        if changes.is_empty() {
            debug!(chore_id, "Empty chore update");
            return self.get(actor, chore_id).await;
        }

        let chore = self
            .store
            .update_chore(family_id, chore_id, changes)
            .await?
            .ok_or_else(chore_not_found)?;

        info!(chore_id, family_id, user_id = actor.id, "Chore updated");
        Ok(chore)
    }

    /// Deletes a chore; its completion history is kept
    pub async fn delete(&self, actor: &User, chore_id: i64) -> DomainResult<()> {
        let family_id = family_of(actor)?;

        if !self.store.delete_chore(family_id, chore_id).await? {
            return Err(chore_not_found());
        }

        info!(chore_id, family_id, user_id = actor.id, "Chore deleted");
        Ok(())
    }

    /// Assigns a chore to a member of the actor's family
    ///
    /// Reassigning replaces the previous assignee.
    pub async fn assign(&self, actor: &User, chore_id: i64, user_id: i64) -> DomainResult<Chore> {
        let family_id = family_of(actor)?;

        if self.store.find_chore(family_id, chore_id).await?.is_none() {
            return Err(chore_not_found());
        }

        self.store
            .find_user(user_id)
            .await?
            .filter(|user| user.family_id == Some(family_id))
            .ok_or_else(|| DomainError::not_found("user"))?;

        let chore = self
            .store
            .assign_chore(family_id, chore_id, user_id)
            .await?
            .ok_or_else(chore_not_found)?;

        info!(chore_id, family_id, assignee_id = user_id, "Chore assigned");
        Ok(chore)
    }

    /// Records the actor completing a chore and credits them its points
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`] if the chore is absent or out of scope
    /// - [`DomainError::Conflict`] if the chore is unassigned under
    ///   [`CompletionPolicy::RequireAssignment`]
    pub async fn complete(&self, actor: &User, chore_id: i64) -> DomainResult<Completion> {
        let family_id = family_of(actor)?;

        self.completions
            .record(
                family_id,
                chore_id,
                actor.id,
                Utc::now(),
                self.policy == CompletionPolicy::SelfClaim,
            )
            .await
    }

    /// All chores of the actor's family, ordered by ID
    pub async fn list(&self, actor: &User) -> DomainResult<Vec<Chore>> {
        let family_id = family_of(actor)?;
        Ok(self.store.list_chores(family_id).await?)
    }
}

fn check_frequency(frequency: Option<&Frequency>) -> DomainResult<()> {
    match frequency {
        Some(frequency) if frequency.as_str().chars().count() > MAX_FREQUENCY_LENGTH => Err(
            DomainError::invalid("frequency", "is too long (maximum is 50 characters)"),
        ),
        _ => Ok(()),
    }
}

fn chore_not_found() -> DomainError {
    DomainError::not_found("chore")
}
