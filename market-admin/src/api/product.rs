//! Product and category API

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::PaginatedResponse;
use shared::error::ApiResponse;
use shared::models::{
    FirstCategory, FirstCategoryQuery, ProductCreate, ProductCreated, ProductDetail,
    ProductListQuery, ProductSummary, SecondCategory,
};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::product as product_service;
use crate::state::AppState;

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<ProductSummary>> {
    Ok(Json(product_service::list(&state, &principal, &query).await?))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<ProductDetail> {
    Ok(Json(product_service::detail(&state, &principal, id).await?))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ProductCreate>,
) -> ApiResult<ApiResponse<ProductCreated>> {
    let created = product_service::create(&state, &principal, &req).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Product registered",
        created,
    )))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    product_service::delete(&state, &principal, id).await?;
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/categories/first?seller_attribute_id=
pub async fn first_categories(
    State(state): State<AppState>,
    Query(query): Query<FirstCategoryQuery>,
) -> ApiResult<Vec<FirstCategory>> {
    Ok(Json(
        product_service::first_categories(&state, query.seller_attribute_id).await?,
    ))
}

/// GET /api/categories/{first_id}/second
pub async fn second_categories(
    State(state): State<AppState>,
    Path(first_id): Path<i64>,
) -> ApiResult<Vec<SecondCategory>> {
    Ok(Json(
        product_service::second_categories(&state, first_id).await?,
    ))
}
