//! Order line API
//!
//! Every write goes through the order-history engine; a batch either
//! commits entirely or not at all.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::error::ApiResponse;
use shared::models::{
    CancelOrderRequest, ChangeStatusRequest, LineIdsRequest, OrderDetailResponse,
    OrderDetailUpdate, OrderListQuery, OrderListResponse, RefundRequestRequest, TransitionResult,
};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::order as order_service;
use crate::state::AppState;

/// GET /api/orders
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<OrderListResponse> {
    Ok(Json(order_service::list(&state, &principal, &query).await?))
}

/// GET /api/orders/{line_id}
pub async fn get_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(line_id): Path<i64>,
) -> ApiResult<OrderDetailResponse> {
    Ok(Json(order_service::detail(&state, &principal, line_id).await?))
}

/// PATCH /api/orders/{line_id}
pub async fn update_order(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(line_id): Path<i64>,
    Json(req): Json<OrderDetailUpdate>,
) -> ApiResult<ApiResponse<()>> {
    order_service::update_detail(&state, &principal, line_id, &req).await?;
    Ok(Json(ApiResponse::ok()))
}

/// POST /api/orders/status
pub async fn change_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ChangeStatusRequest>,
) -> ApiResult<TransitionResult> {
    Ok(Json(
        order_service::change_status(&state, &principal, &req).await?,
    ))
}

/// POST /api/orders/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CancelOrderRequest>,
) -> ApiResult<TransitionResult> {
    Ok(Json(order_service::cancel(&state, &principal, &req).await?))
}

/// POST /api/orders/refund-request
pub async fn request_refund(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<RefundRequestRequest>,
) -> ApiResult<TransitionResult> {
    Ok(Json(
        order_service::request_refund(&state, &principal, &req).await?,
    ))
}

/// POST /api/orders/refund-complete
pub async fn complete_refund(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<LineIdsRequest>,
) -> ApiResult<TransitionResult> {
    Ok(Json(
        order_service::complete_refund(&state, &principal, &req).await?,
    ))
}

/// POST /api/orders/refund-withdraw
pub async fn withdraw_refund(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<LineIdsRequest>,
) -> ApiResult<TransitionResult> {
    Ok(Json(
        order_service::withdraw_refund(&state, &principal, &req).await?,
    ))
}
