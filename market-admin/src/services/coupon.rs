//! Coupon management (admin only)

use shared::PaginatedResponse;
use shared::error::{AppError, ErrorCode};
use shared::models::{CouponCreate, CouponDetail, CouponListQuery, CouponSummary, CouponUpdate};
use shared::pagination::Page;
use shared::util::now_local;
use validator::Validate;

use crate::auth::Principal;
use crate::db::coupon as coupon_db;
use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn list(
    state: &AppState,
    principal: &Principal,
    query: &CouponListQuery,
) -> ServiceResult<PaginatedResponse<CouponSummary>> {
    principal.require_admin()?;

    let builder = coupon_db::list_filter(query);
    let page = Page::fixed(query.page, coupon_db::PAGE_SIZE);
    let coupons = coupon_db::list_coupons(&state.pool, &builder, page).await?;
    let total = coupon_db::count_coupons(&state.pool, &builder).await?;
    Ok(PaginatedResponse::new(coupons, total as u64, page))
}

pub async fn detail(
    state: &AppState,
    principal: &Principal,
    coupon_id: i64,
) -> ServiceResult<CouponDetail> {
    principal.require_admin()?;
    let coupon = coupon_db::get_detail(&state.pool, coupon_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CouponNotFound))?;
    Ok(coupon)
}

pub async fn create(
    state: &AppState,
    principal: &Principal,
    coupon: &CouponCreate,
) -> ServiceResult<i64> {
    principal.require_admin()?;
    coupon.validate().map_err(|e| {
        if e.errors().contains_key("__all__") {
            AppError::with_message(ErrorCode::CouponDateRangeInvalid, e.to_string())
        } else {
            e.into()
        }
    })?;

    let mut tx = state.pool.begin().await?;
    let id = coupon_db::create(&mut tx, coupon, now_local()).await?;
    tx.commit().await?;

    tracing::info!(coupon_id = id, name = %coupon.coupon_name, "Coupon created");
    Ok(id)
}

pub async fn update(
    state: &AppState,
    principal: &Principal,
    coupon_id: i64,
    change: &CouponUpdate,
) -> ServiceResult<()> {
    principal.require_admin()?;
    change.validate()?;

    let mut tx = state.pool.begin().await?;
    if coupon_db::update(&mut tx, coupon_id, change).await? == 0 {
        return Err(AppError::new(ErrorCode::CouponNotFound).into());
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete(state: &AppState, principal: &Principal, coupon_id: i64) -> ServiceResult<()> {
    principal.require_admin()?;

    let mut tx = state.pool.begin().await?;
    if coupon_db::soft_delete(&mut tx, coupon_id).await? == 0 {
        return Err(AppError::new(ErrorCode::CouponNotFound).into());
    }
    tx.commit().await?;

    tracing::info!(coupon_id, "Coupon deleted");
    Ok(())
}
