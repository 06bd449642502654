//! Bearer-token authentication for axum
//!
//! [`session_auth_middleware`] reads `Authorization: Bearer <token>`,
//! resolves it through the [`IdentityService`], and stores an
//! [`AuthContext`] in the request extensions. Requests that fail are
//! answered with 401 before any handler runs.
//!
//! # Example
//!
//! ```no_run
//! use axum::{middleware, routing::get, Extension, Router};
//! use chorely_shared::auth::middleware::{session_auth_middleware, AuthContext};
//! use chorely_shared::services::IdentityService;
//!
//! async fn me(Extension(auth): Extension<AuthContext>) -> String {
//!     format!("Hello, {}!", auth.user.name)
//! }
//!
//! fn router(identity: IdentityService) -> Router {
//!     Router::new()
//!         .route("/me", get(me))
//!         .route_layer(middleware::from_fn(move |req, next| {
//!             session_auth_middleware(identity.clone(), req, next)
//!         }))
//! }
//! ```

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::DomainError;
use crate::models::user::User;
use crate::services::IdentityService;

/// Authenticated caller, added to request extensions
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use chorely_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User {} in family {:?}", auth.user.id, auth.user.family_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The user as loaded for this request
    pub user: User,

    /// Raw bearer token, needed for sign-out
    pub token: String,
}

impl AuthContext {
    pub fn new(user: User, token: String) -> Self {
        Self { user, token }
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat,

    /// Token rejected
    InvalidToken,

    /// Storage failure while resolving the token
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Missing bearer token",
            ),
            AuthError::InvalidFormat => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Expected Bearer token",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "unauthorized", "unauthorized"),
            AuthError::Internal(detail) => {
                error!(error = %detail, "Authentication failed internally");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred",
                )
            }
        };

        let body = Json(json!({ "error": error, "message": message }));
        (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidFormat)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Session authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing or malformed, or the
/// token is invalid, expired, or revoked. Returns 500 if the store fails.
pub async fn session_auth_middleware(
    identity: IdentityService,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(req.headers())?.to_string();

    let user = identity.resolve_token(&token).await.map_err(|e| match e {
        DomainError::Internal(detail) => AuthError::Internal(detail),
        _ => AuthError::InvalidToken,
    })?;

    req.extensions_mut().insert(AuthContext::new(user, token));

    Ok(next.run(req).await)
}
