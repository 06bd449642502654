//! Domain error taxonomy
//!
//! Every service operation returns [`DomainResult`]. The HTTP layer maps each
//! variant to a status code; nothing here knows about HTTP.

use serde::Serialize;
use validator::ValidationErrors;

use crate::auth::password::PasswordError;
use crate::auth::token::TokenError;
use crate::store::StoreError;

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the domain services
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Input failed validation
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Caller is not authenticated or lacks a family
    #[error("{0}")]
    Auth(String),

    /// Request conflicts with current state
    #[error("{0}")]
    Conflict(String),

    /// Entity does not exist or is outside the caller's family
    #[error("{0}")]
    NotFound(String),

    /// Storage or infrastructure failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn unauthorized() -> Self {
        DomainError::Auth("unauthorized".to_string())
    }

    pub fn not_found(entity: &str) -> Self {
        DomainError::NotFound(format!("{} not found", entity))
    }
}

/// Domain result type alias
pub type DomainResult<T> = Result<T, DomainError>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => {
                DomainError::Conflict("email has already been taken".to_string())
            }
            StoreError::AlreadyInFamily(_) => {
                DomainError::Conflict("user already belongs to a family".to_string())
            }
            StoreError::Unassigned(_) => DomainError::Conflict(
                "chore must be assigned before it can be completed".to_string(),
            ),
            StoreError::PointsOverflow(_) => {
                DomainError::Conflict("points total would overflow".to_string())
            }
            StoreError::NotFound { entity, .. } => DomainError::not_found(entity),
            // Services retry join code collisions; reaching here means they gave up
            StoreError::DuplicateJoinCode => {
                DomainError::Internal("could not allocate a unique join code".to_string())
            }
            StoreError::Database(e) => DomainError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();

        // HashMap iteration order is unstable
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        DomainError::Validation(fields)
    }
}

impl From<PasswordError> for DomainError {
    fn from(err: PasswordError) -> Self {
        DomainError::Internal(err.to_string())
    }
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::CreateError(msg) => DomainError::Internal(msg),
            _ => DomainError::unauthorized(),
        }
    }
}
