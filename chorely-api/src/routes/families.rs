/// Family endpoints
///
/// A user belongs to at most one family. Creating or joining while already
/// in one is a conflict.

use crate::{app::AppState, error::ApiResult, extract::ApiJson};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chorely_shared::{
    auth::middleware::AuthContext, models::family::FamilyRoster, services::family::CreateFamily,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    pub family: CreateFamily,
}

#[derive(Debug, Deserialize)]
pub struct JoinFamilyRequest {
    pub join_code: String,
}

/// Create a family with the caller as its first member
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/families
///
/// { "family": { "name": "Test Family" } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Blank name
/// - `409 Conflict`: Caller already has a family
pub async fn create_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateFamilyRequest>,
) -> ApiResult<(StatusCode, Json<FamilyRoster>)> {
    let roster = state.families.create_family(&auth.user, req.family).await?;
    Ok((StatusCode::CREATED, Json(roster)))
}

/// Join a family by code
///
/// # Errors
///
/// - `404 Not Found`: No family has this code
/// - `409 Conflict`: Caller already has a family
pub async fn join_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<JoinFamilyRequest>,
) -> ApiResult<Json<FamilyRoster>> {
    let roster = state.families.join_family(&auth.user, &req.join_code).await?;
    Ok(Json(roster))
}

/// The caller's family with its members
pub async fn my_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<FamilyRoster>> {
    Ok(Json(state.families.get_my_family(&auth.user).await?))
}
