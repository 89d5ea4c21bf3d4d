//! Order service
//!
//! Batches are validated before a transaction is opened. Every transition
//! batch runs in one transaction: any error drops it, which rolls back.

use shared::error::AppError;
use shared::models::{
    CancelOrderRequest, ChangeStatusRequest, LineIdsRequest, OrderDetailResponse,
    OrderDetailUpdate, OrderListQuery, OrderListResponse, RefundRequestRequest, TransitionResult,
};
use shared::util::now_local;

use crate::auth::Principal;
use crate::db::order::{self as order_db, OrderFilter};
use crate::error::ServiceResult;
use crate::orders::{self, PgLineHistory, TransitionBatch};
use crate::state::AppState;

pub async fn list(
    state: &AppState,
    principal: &Principal,
    query: &OrderListQuery,
) -> ServiceResult<OrderListResponse> {
    let mut filter = OrderFilter::from_query(query)?;
    if let Some(seller_id) = principal.seller_scope() {
        filter.restrict_to_seller(seller_id);
    }

    let orders = order_db::list_orders(&state.pool, &filter).await?;
    let total_count = order_db::count_orders(&state.pool, &filter).await?;
    let page = filter.page();

    Ok(OrderListResponse {
        orders,
        total_count,
        page: page.page,
        limit: page.limit,
    })
}

pub async fn detail(
    state: &AppState,
    principal: &Principal,
    line_id: i64,
) -> ServiceResult<OrderDetailResponse> {
    ensure_own_lines(state, principal, &[line_id]).await?;

    let order = order_db::get_detail(&state.pool, line_id)
        .await?
        .ok_or_else(|| AppError::line_not_found(line_id))?;
    let history = order_db::list_history(&state.pool, line_id).await?;

    Ok(OrderDetailResponse { order, history })
}

/// Non-admin sellers may only touch lines of their own products.
async fn ensure_own_lines(
    state: &AppState,
    principal: &Principal,
    line_ids: &[i64],
) -> ServiceResult<()> {
    let Some(seller_id) = principal.seller_scope() else {
        return Ok(());
    };
    if let Some(line_id) = order_db::first_foreign_line(&state.pool, line_ids, seller_id).await? {
        tracing::warn!(seller_id, line_id, "Seller touched a foreign order line");
        return Err(AppError::permission_denied("Order line belongs to another seller")
            .with_detail("line_id", line_id)
            .into());
    }
    Ok(())
}

async fn run_batch(
    state: &AppState,
    principal: &Principal,
    line_ids: &[i64],
    batch: TransitionBatch,
) -> ServiceResult<TransitionResult> {
    ensure_own_lines(state, principal, line_ids).await?;

    let mut tx = state.pool.begin().await?;
    let result = {
        let mut store = PgLineHistory::new(&mut tx);
        orders::engine::execute(&mut store, &batch, now_local()).await?
    };
    tx.commit().await?;

    Ok(result)
}

pub async fn change_status(
    state: &AppState,
    principal: &Principal,
    req: &ChangeStatusRequest,
) -> ServiceResult<TransitionResult> {
    let batch = TransitionBatch::change_status(&req.line_ids, req.next_status)?;
    run_batch(state, principal, &req.line_ids, batch).await
}

pub async fn cancel(
    state: &AppState,
    principal: &Principal,
    req: &CancelOrderRequest,
) -> ServiceResult<TransitionResult> {
    let batch = TransitionBatch::cancel(&req.line_ids, &req.cancel_reason_ids)?;
    run_batch(state, principal, &req.line_ids, batch).await
}

pub async fn request_refund(
    state: &AppState,
    principal: &Principal,
    req: &RefundRequestRequest,
) -> ServiceResult<TransitionResult> {
    let batch = TransitionBatch::request_refund(
        &req.line_ids,
        &req.refund_reason_ids,
        &req.refund_detail_reasons,
        &req.refund_amounts,
    )?;
    run_batch(state, principal, &req.line_ids, batch).await
}

pub async fn complete_refund(
    state: &AppState,
    principal: &Principal,
    req: &LineIdsRequest,
) -> ServiceResult<TransitionResult> {
    let batch = TransitionBatch::complete_refund(&req.line_ids)?;
    run_batch(state, principal, &req.line_ids, batch).await
}

pub async fn withdraw_refund(
    state: &AppState,
    principal: &Principal,
    req: &LineIdsRequest,
) -> ServiceResult<TransitionResult> {
    let batch = TransitionBatch::withdraw_refund(&req.line_ids)?;
    run_batch(state, principal, &req.line_ids, batch).await
}

/// In-place corrections to the order header and the open interval.
pub async fn update_detail(
    state: &AppState,
    principal: &Principal,
    line_id: i64,
    change: &OrderDetailUpdate,
) -> ServiceResult<()> {
    if !change.touches_order() && !change.touches_line() {
        return Err(AppError::invalid_request("Nothing to update").into());
    }
    ensure_own_lines(state, principal, &[line_id]).await?;

    let mut tx = state.pool.begin().await?;
    if change.touches_order() && order_db::update_order_header(&mut tx, line_id, change).await? == 0
    {
        return Err(AppError::line_not_found(line_id).into());
    }
    if change.touches_line() && order_db::update_open_line(&mut tx, line_id, change).await? == 0 {
        return Err(AppError::line_not_found(line_id).into());
    }
    tx.commit().await?;

    tracing::info!(line_id, "Order detail updated in place");
    Ok(())
}
