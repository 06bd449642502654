//! Completion log
//!
//! Append-only history of finished chores, read back per family.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::family_of;
use crate::error::DomainResult;
use crate::models::completion::{Completion, NewCompletion};
use crate::models::user::User;
use crate::store::Store;

#[derive(Clone)]
pub struct CompletionLog {
    store: Arc<dyn Store>,
}

impl CompletionLog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records that `user_id` completed a chore of `family_id` at `at`
    ///
    /// The insert, the chore's `last_completed_at` stamp, and the point
    /// credit happen together or not at all. The caller has already checked
    /// that chore and completer share the family.
    pub async fn record(
        &self,
        family_id: i64,
        chore_id: i64,
        user_id: i64,
        at: DateTime<Utc>,
        claim_if_unassigned: bool,
    ) -> DomainResult<Completion> {
        let completion = self
            .store
            .append_completion(NewCompletion {
                chore_id,
                family_id,
                user_id,
                completed_at: at,
                claim_if_unassigned,
            })
            .await?;

        info!(
            completion_id = completion.id,
            chore_id,
            user_id,
            family_id,
            "Chore completed"
        );
        Ok(completion)
    }

    /// The actor's family history, most recent first
    pub async fn list(&self, actor: &User) -> DomainResult<Vec<Completion>> {
        let family_id = family_of(actor)?;
        Ok(self.store.list_completions(family_id).await?)
    }
}
