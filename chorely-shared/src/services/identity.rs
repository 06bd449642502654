//! Identity service
//!
//! Owns user accounts and sessions. A session token is only accepted while
//! its signature, issuer and expiry check out *and* its backing session row
//! exists and has not been revoked.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::trimmed;
use crate::auth::password::{hash_password, verify_password, HashCost};
use crate::auth::token::{create_token, validate_token, Claims};
use crate::error::{DomainError, DomainResult};
use crate::models::session::NewSession;
use crate::models::user::{normalize_email, NewUser, User};
use crate::store::Store;

/// Sign-up input
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(
        email(message = "is invalid"),
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub email: String,

    #[validate(length(min = 8, message = "is too short (minimum is 8 characters)"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "doesn't match password"))]
    pub password_confirmation: String,
}

/// Sign-in input
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A user together with a freshly issued session token
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

/// Token signing parameters
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub ttl: Duration,
}

/// User accounts, credentials and sessions
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenSettings>,
    hash_cost: HashCost,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>, tokens: TokenSettings, hash_cost: HashCost) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            hash_cost,
        }
    }

    /// Creates an account and signs it in
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] for a blank name, malformed email, short
    ///   password, or mismatched confirmation
    /// - [`DomainError::Conflict`] if the email is already registered
    pub async fn register(&self, input: RegisterUser) -> DomainResult<Authenticated> {
        let input = RegisterUser {
            name: trimmed(&input.name),
            email: normalize_email(&input.email),
            ..input
        };
        input.validate()?;

        // Cheap pre-check so a duplicate doesn't pay for a hash; the store's
        // unique index is what actually enforces it
        if self.store.find_user_by_email(&input.email).await?.is_some() {
            return Err(DomainError::Conflict(
                "email has already been taken".to_string(),
            ));
        }

        let password_hash = self.hash(input.password).await?;
        let user = self
            .store
            .insert_user(NewUser {
                email: input.email,
                name: input.name,
                password_hash,
            })
            .await?;

        info!(user_id = user.id, "User registered");

        let token = self.open_session(user.id).await?;
        Ok(Authenticated { user, token })
    }

    /// Verifies credentials and opens a new session
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn authenticate(&self, credentials: Credentials) -> DomainResult<Authenticated> {
        let email = normalize_email(&credentials.email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!("Sign-in rejected: unknown email");
            return Err(invalid_credentials());
        };

        if !self
            .verify(credentials.password, user.password_hash.clone())
            .await?
        {
            warn!(user_id = user.id, "Sign-in rejected: wrong password");
            return Err(invalid_credentials());
        }

        info!(user_id = user.id, "User signed in");

        let token = self.open_session(user.id).await?;
        Ok(Authenticated { user, token })
    }

    /// Resolves a bearer token to its user
    ///
    /// Fails with [`DomainError::Auth`] for malformed, badly signed,
    /// expired, revoked, or orphaned tokens.
    pub async fn resolve_token(&self, token: &str) -> DomainResult<User> {
        let claims = validate_token(token, &self.tokens.secret).map_err(|e| {
            debug!(error = %e, "Token rejected");
            DomainError::unauthorized()
        })?;

        let session = self
            .store
            .find_session(claims.jti)
            .await?
            .filter(|session| session.user_id == claims.sub && session.is_active_at(Utc::now()))
            .ok_or_else(|| {
                debug!(session_id = %claims.jti, "Session inactive");
                DomainError::unauthorized()
            })?;

        self.store
            .find_user(session.user_id)
            .await?
            .ok_or_else(DomainError::unauthorized)
    }

    /// Revokes the session behind a token
    ///
    /// Idempotent: tokens that don't parse or name an unknown session are
    /// ignored.
    pub async fn revoke(&self, token: &str) -> DomainResult<()> {
        let Ok(claims) = validate_token(token, &self.tokens.secret) else {
            return Ok(());
        };

        if self.store.revoke_session(claims.jti, Utc::now()).await? {
            info!(user_id = claims.sub, session_id = %claims.jti, "Session revoked");
        }
        Ok(())
    }

    /// Loads a user by ID
    pub async fn user(&self, id: i64) -> DomainResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    async fn open_session(&self, user_id: i64) -> DomainResult<String> {
        let claims = Claims::new(user_id, Uuid::new_v4(), self.tokens.ttl);

        self.store
            .insert_session(NewSession {
                id: claims.jti,
                user_id,
                issued_at: Utc::now(),
                expires_at: claims.expires_at(),
            })
            .await?;

        Ok(create_token(&claims, &self.tokens.secret)?)
    }

    async fn hash(&self, password: String) -> DomainResult<String> {
        let cost = self.hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, &cost))
            .await
            .map_err(|e| DomainError::Internal(format!("hashing task failed: {}", e)))?
            .map_err(DomainError::from)
    }

    async fn verify(&self, password: String, hash: String) -> DomainResult<bool> {
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| DomainError::Internal(format!("verification task failed: {}", e)))?
            .map_err(DomainError::from)
    }
}

fn invalid_credentials() -> DomainError {
    DomainError::Auth("invalid email or password".to_string())
}
