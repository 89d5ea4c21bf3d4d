//! Coupon management API (admin only)

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::PaginatedResponse;
use shared::error::ApiResponse;
use shared::models::{CouponCreate, CouponDetail, CouponListQuery, CouponSummary, CouponUpdate};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::coupon as coupon_service;
use crate::state::AppState;

/// GET /api/coupons
pub async fn list_coupons(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<CouponListQuery>,
) -> ApiResult<PaginatedResponse<CouponSummary>> {
    Ok(Json(coupon_service::list(&state, &principal, &query).await?))
}

/// GET /api/coupons/{id}
pub async fn get_coupon(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<CouponDetail> {
    Ok(Json(coupon_service::detail(&state, &principal, id).await?))
}

/// POST /api/coupons
pub async fn create_coupon(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CouponCreate>,
) -> ApiResult<ApiResponse<i64>> {
    let id = coupon_service::create(&state, &principal, &req).await?;
    Ok(Json(ApiResponse::success_with_message("Coupon created", id)))
}

/// PUT /api/coupons/{id}
pub async fn update_coupon(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(req): Json<CouponUpdate>,
) -> ApiResult<ApiResponse<()>> {
    coupon_service::update(&state, &principal, id, &req).await?;
    Ok(Json(ApiResponse::ok()))
}

/// DELETE /api/coupons/{id}
pub async fn delete_coupon(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    coupon_service::delete(&state, &principal, id).await?;
    Ok(Json(ApiResponse::ok()))
}
