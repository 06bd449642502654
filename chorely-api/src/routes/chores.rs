/// Chore endpoints
///
/// All chore routes are scoped to the caller's family. IDs from other
/// families answer `404 Not Found`.
///
/// # Endpoints
///
/// - `GET /api/v1/chores` - List the family's chores
/// - `POST /api/v1/chores` - Create a chore
/// - `GET /api/v1/chores/:id` - Show a chore
/// - `PUT /api/v1/chores/:id` - Update some fields
/// - `DELETE /api/v1/chores/:id` - Delete, keeping its history
/// - `POST /api/v1/chores/:id/assign` - Assign to a family member
/// - `POST /api/v1/chores/:id/complete` - Record a completion

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chorely_shared::{
    auth::middleware::AuthContext,
    models::{chore::Chore, completion::Completion},
    services::chore::{CreateChore, UpdateChore},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateChoreRequest {
    pub chore: CreateChore,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChoreRequest {
    #[serde(default)]
    pub chore: UpdateChore,
}

#[derive(Debug, Deserialize)]
pub struct AssignChoreRequest {
    pub user_id: i64,
}

pub async fn list_chores(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Chore>>> {
    Ok(Json(state.chores.list(&auth.user).await?))
}

/// Create a chore
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/chores
///
/// {
///   "chore": {
///     "name": "Wash Dishes",
///     "description": "After dinner",
///     "points": 10,
///     "frequency": "daily"
///   }
/// }
/// ```
///
/// `frequency` defaults to `daily`. The new chore is unassigned.
///
/// # Errors
///
/// - `400 Bad Request`: Blank name or non-positive points
/// - `401 Unauthorized`: Caller has no family
pub async fn create_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateChoreRequest>,
) -> ApiResult<(StatusCode, Json<Chore>)> {
    let chore = state.chores.create(&auth.user, req.chore).await?;
    Ok((StatusCode::CREATED, Json(chore)))
}

pub async fn get_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Chore>> {
    Ok(Json(state.chores.get(&auth.user, id).await?))
}

pub async fn update_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateChoreRequest>,
) -> ApiResult<Json<Chore>> {
    Ok(Json(state.chores.update(&auth.user, id, req.chore).await?))
}

pub async fn delete_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.chores.delete(&auth.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign a chore to a member of the caller's family
///
/// # Errors
///
/// - `404 Not Found`: Unknown chore, or user outside the family
pub async fn assign_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<AssignChoreRequest>,
) -> ApiResult<Json<Chore>> {
    Ok(Json(state.chores.assign(&auth.user, id, req.user_id).await?))
}

/// Record that the caller completed a chore
///
/// Credits the chore's points to the caller and stamps
/// `last_completed_at`.
///
/// # Errors
///
/// - `404 Not Found`: Unknown chore
/// - `409 Conflict`: Chore is unassigned and self-claiming is disabled
pub async fn complete_chore(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<(StatusCode, Json<Completion>)> {
    let completion = state.chores.complete(&auth.user, id).await?;
    Ok((StatusCode::CREATED, Json(completion)))
}
