//! Shop member listing

use axum::extract::{Query, State};
use axum::{Extension, Json};
use shared::PaginatedResponse;
use shared::models::{UserListQuery, UserSummary};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::user as user_service;
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<PaginatedResponse<UserSummary>> {
    Ok(Json(user_service::list(&state, &principal, &query).await?))
}
