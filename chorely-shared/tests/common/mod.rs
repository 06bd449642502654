//! Shared fixtures for service-level tests

#![allow(dead_code)]

use std::sync::Arc;

use chorely_shared::auth::password::HashCost;
use chorely_shared::models::user::User;
use chorely_shared::services::family::CreateFamily;
use chorely_shared::services::identity::{RegisterUser, TokenSettings};
use chorely_shared::services::{
    ChoreLedger, CompletionLog, CompletionPolicy, FamilyRegistry, IdentityService,
};
use chorely_shared::store::{MemoryStore, Store};

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// All four services wired to one store
pub struct Services {
    pub store: Arc<dyn Store>,
    pub identity: IdentityService,
    pub families: FamilyRegistry,
    pub chores: ChoreLedger,
    pub completions: CompletionLog,
}

impl Services {
    pub fn in_memory(policy: CompletionPolicy) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), policy)
    }

    pub fn with_store(store: Arc<dyn Store>, policy: CompletionPolicy) -> Self {
        let identity = IdentityService::new(
            store.clone(),
            TokenSettings {
                secret: TEST_SECRET.to_string(),
                ttl: chrono::Duration::hours(1),
            },
            HashCost::minimal(),
        );
        let completions = CompletionLog::new(store.clone());
        let chores = ChoreLedger::new(store.clone(), completions.clone(), policy);
        let families = FamilyRegistry::new(store.clone());

        Self {
            store,
            identity,
            families,
            chores,
            completions,
        }
    }

    pub async fn register(&self, name: &str, email: &str) -> User {
        self.identity
            .register(RegisterUser {
                name: name.to_string(),
                email: email.to_string(),
                password: "password123".to_string(),
                password_confirmation: "password123".to_string(),
            })
            .await
            .expect("registration should succeed")
            .user
    }

    /// Fresh copy of a user, as the access gateway would load it
    pub async fn reload(&self, user: &User) -> User {
        self.identity.user(user.id).await.expect("user should exist")
    }

    /// Registers a user who owns a new family; returns (owner, join_code)
    pub async fn family_owner(&self, name: &str, email: &str, family: &str) -> (User, String) {
        let owner = self.register(name, email).await;
        let roster = self
            .families
            .create_family(
                &owner,
                CreateFamily {
                    name: family.to_string(),
                },
            )
            .await
            .expect("family creation should succeed");
        (self.reload(&owner).await, roster.join_code)
    }

    /// Registers a user and joins them to a family
    pub async fn member(&self, name: &str, email: &str, join_code: &str) -> User {
        let user = self.register(name, email).await;
        self.families
            .join_family(&user, join_code)
            .await
            .expect("join should succeed");
        self.reload(&user).await
    }
}
