//! Family registry
//!
//! Creates families, hands out join codes, and resolves rosters. A user's
//! family is set exactly once, by either creating or joining.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};
use validator::Validate;

use super::trimmed;
use crate::auth::join_code::{generate_join_code, is_valid_join_code, normalize_join_code};
use crate::error::{DomainError, DomainResult};
use crate::models::family::{Family, FamilyRoster, NewFamily};
use crate::models::user::User;
use crate::store::{Store, StoreError};

/// Attempts at finding an unused join code before giving up
const MAX_JOIN_CODE_ATTEMPTS: usize = 5;

/// Create-family input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFamily {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Clone)]
pub struct FamilyRegistry {
    store: Arc<dyn Store>,
}

impl FamilyRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a family owned by `owner` and makes them its first member
    ///
    /// # Errors
    ///
    /// - [`DomainError::Conflict`] if the owner already belongs to a family
    /// - [`DomainError::Validation`] if the name is blank
    pub async fn create_family(
        &self,
        owner: &User,
        input: CreateFamily,
    ) -> DomainResult<FamilyRoster> {
        if owner.family_id.is_some() {
            return Err(already_in_family());
        }

        let input = CreateFamily {
            name: trimmed(&input.name),
        };
        input.validate()?;

        for attempt in 1..=MAX_JOIN_CODE_ATTEMPTS {
            let join_code = generate_join_code();
            if self.store.join_code_exists(&join_code).await? {
                debug!(attempt, "Join code collision, regenerating");
                continue;
            }

            let data = NewFamily {
                name: input.name.clone(),
                join_code,
            };

            match self.store.create_family(owner.id, data).await {
                Ok(family) => {
                    info!(family_id = family.id, owner_id = owner.id, "Family created");
                    return self.roster(family).await;
                }
                // Lost a race for the code between the check and the insert
                Err(StoreError::DuplicateJoinCode) => {
                    debug!(attempt, "Join code taken concurrently, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(owner_id = owner.id, "Exhausted join code attempts");
        Err(StoreError::DuplicateJoinCode.into())
    }

    /// Adds `user` to the family identified by `join_code`
    ///
    /// The code is matched after trimming and uppercasing.
    ///
    /// # Errors
    ///
    /// - [`DomainError::NotFound`] if no family has this code
    /// - [`DomainError::Conflict`] if the user already belongs to a family
    pub async fn join_family(&self, user: &User, join_code: &str) -> DomainResult<FamilyRoster> {
        let join_code = normalize_join_code(join_code);

        if !is_valid_join_code(&join_code) {
            return Err(DomainError::not_found("family"));
        }

        let family = self
            .store
            .find_family_by_join_code(&join_code)
            .await?
            .ok_or_else(|| DomainError::not_found("family"))?;

        if user.family_id.is_some() {
            return Err(already_in_family());
        }

        self.store.add_family_member(family.id, user.id).await?;
        info!(family_id = family.id, user_id = user.id, "User joined family");

        self.roster(family).await
    }

    /// The user's family with its current roster
    pub async fn get_my_family(&self, user: &User) -> DomainResult<FamilyRoster> {
        let family_id = user
            .family_id
            .ok_or_else(|| DomainError::not_found("family"))?;

        let family = self
            .store
            .find_family(family_id)
            .await?
            .ok_or_else(|| DomainError::not_found("family"))?;

        self.roster(family).await
    }

    async fn roster(&self, family: Family) -> DomainResult<FamilyRoster> {
        let members = self.store.list_family_members(family.id).await?;
        Ok(FamilyRoster::new(family, &members))
    }
}

fn already_in_family() -> DomainError {
    DomainError::Conflict("user already belongs to a family".to_string())
}
