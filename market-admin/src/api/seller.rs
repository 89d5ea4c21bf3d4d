//! Seller account API

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::error::ApiResponse;
use shared::models::{
    LoginResponse, SellerHistoryEntry, SellerListQuery, SellerListResponse, SellerLogin,
    SellerLookup, SellerProfile, SellerProfileUpdate, SellerSearchQuery, SellerSignup,
};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::seller as seller_service;
use crate::state::AppState;

/// POST /api/sellers/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SellerSignup>,
) -> ApiResult<ApiResponse<i64>> {
    let seller_id = seller_service::signup(&state, &req).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Signup received, pending approval",
        seller_id,
    )))
}

/// POST /api/sellers/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<SellerLogin>,
) -> ApiResult<LoginResponse> {
    Ok(Json(seller_service::login(&state, &req).await?))
}

/// GET /api/sellers
pub async fn list_sellers(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<SellerListQuery>,
) -> ApiResult<SellerListResponse> {
    Ok(Json(seller_service::list(&state, &principal, &query).await?))
}

/// GET /api/sellers/search?name=
pub async fn search_sellers(
    State(state): State<AppState>,
    Query(query): Query<SellerSearchQuery>,
) -> ApiResult<Vec<SellerLookup>> {
    let name = query.name.unwrap_or_default();
    Ok(Json(seller_service::search_by_name(&state, &name).await?))
}

/// GET /api/sellers/{id}
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<SellerProfile> {
    Ok(Json(seller_service::profile(&state, &principal, id).await?))
}

/// PUT /api/sellers/{id}
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(req): Json<SellerProfileUpdate>,
) -> ApiResult<SellerProfile> {
    Ok(Json(
        seller_service::update_profile(&state, &principal, id, &req).await?,
    ))
}

/// GET /api/sellers/{id}/history
pub async fn profile_history(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<SellerHistoryEntry>> {
    Ok(Json(seller_service::history(&state, &principal, id).await?))
}
