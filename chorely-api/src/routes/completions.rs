/// Completion history endpoint

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chorely_shared::{auth::middleware::AuthContext, models::completion::Completion};

/// The caller's family completions, most recent first
pub async fn list_completions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Completion>>> {
    Ok(Json(state.completions.list(&auth.user).await?))
}
