/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/v1/auth/sign_up` - Register and receive a token
/// - `POST /api/v1/auth/sign_in` - Exchange credentials for a token
/// - `DELETE /api/v1/auth/sign_out` - Revoke the current token
/// - `GET /api/v1/auth/me` - The signed-in user

use crate::{app::AppState, error::ApiResult, extract::ApiJson};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chorely_shared::{
    auth::middleware::AuthContext,
    models::user::UserProfile,
    services::identity::{Authenticated, Credentials, RegisterUser},
};
use serde::{Deserialize, Serialize};

/// Sign-up request
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub user: RegisterUser,
}

/// Sign-in request
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub user: Credentials,
}

/// Returned by sign-up and sign-in
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: UserProfile,

    /// Bearer token for subsequent requests
    pub token: String,
}

impl From<Authenticated> for SessionResponse {
    fn from(auth: Authenticated) -> Self {
        Self {
            user: UserProfile::from(&auth.user),
            token: auth.token,
        }
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/sign_up
/// Content-Type: application/json
///
/// {
///   "user": {
///     "name": "Alice",
///     "email": "alice@example.com",
///     "password": "password123",
///     "password_confirmation": "password123"
///   }
/// }
/// ```
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "user": { "id": 1, "email": "alice@example.com", "name": "Alice", "points": 0, "family_id": null },
///   "token": "eyJ..."
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Email already exists
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let authenticated = state.identity.register(req.user).await?;
    Ok((StatusCode::CREATED, Json(authenticated.into())))
}

/// Sign in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
pub async fn sign_in(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let authenticated = state.identity.authenticate(req.user).await?;
    Ok(Json(authenticated.into()))
}

/// Revoke the token used for this request
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    state.identity.revoke(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<UserProfile> {
    Json(UserProfile::from(&auth.user))
}
