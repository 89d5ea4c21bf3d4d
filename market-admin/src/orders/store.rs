//! Storage seam for order-line history
//!
//! The engine only needs four primitives on `order_item_info`; the Postgres
//! implementation runs them on the caller's transaction connection.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::models::{OrderLineRecord, OrderStatus};
use shared::util::open_end;
use sqlx::PgConnection;

use super::error::HistoryResult;
use crate::db::query::live;

#[async_trait]
pub trait LineHistoryStore: Send {
    /// Open interval of a line, row-locked until the transaction ends.
    async fn lock_open(&mut self, line_id: i64) -> HistoryResult<Option<OrderLineRecord>>;

    /// Close an interval if it is still open. Returns the affected row count.
    async fn close(&mut self, record_id: i64, at: NaiveDateTime) -> HistoryResult<u64>;

    /// Insert a successor interval, returning its row id.
    async fn insert(&mut self, record: &OrderLineRecord) -> HistoryResult<i64>;

    /// Most recent status the line held before `before`, skipping refund-requested intervals.
    async fn status_before_refund(
        &mut self,
        line_id: i64,
        before: NaiveDateTime,
    ) -> HistoryResult<Option<OrderStatus>>;
}

pub(crate) const LINE_COLUMNS: &str = r#"
    id, order_detail_id, order_id, order_status_id, product_id, price,
    option_color, option_size, option_additional_price, units, discount_price,
    shipping_start_date, shipping_complete_date, shipping_company, shipping_number,
    is_confirm_order, refund_request_date, refund_complete_date, refund_reason_id,
    refund_amount, refund_shipping_fee, detail_reason, bank, account_holder,
    account_number, cancel_reason_id, complete_cancellation_date,
    start_date, end_date, modifier_id
"#;

/// Open, live interval of one line, locked until the transaction ends
fn lock_open_sql() -> String {
    format!(
        "SELECT {LINE_COLUMNS} FROM order_item_info \
         WHERE order_detail_id = $1 AND end_date = $2 AND {} FOR UPDATE",
        live("")
    )
}

/// `order_item_info` accessed through an open transaction
pub struct PgLineHistory<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgLineHistory<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl LineHistoryStore for PgLineHistory<'_> {
    async fn lock_open(&mut self, line_id: i64) -> HistoryResult<Option<OrderLineRecord>> {
        let row = sqlx::query_as::<_, OrderLineRecord>(&lock_open_sql())
            .bind(line_id)
            .bind(open_end())
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row)
    }

    async fn close(&mut self, record_id: i64, at: NaiveDateTime) -> HistoryResult<u64> {
        let result = sqlx::query(
            "UPDATE order_item_info SET end_date = $1 WHERE id = $2 AND end_date = $3",
        )
        .bind(at)
        .bind(record_id)
        .bind(open_end())
        .execute(&mut *self.conn)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&mut self, r: &OrderLineRecord) -> HistoryResult<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO order_item_info (
                order_detail_id, order_id, order_status_id, product_id, price,
                option_color, option_size, option_additional_price, units, discount_price,
                shipping_start_date, shipping_complete_date, shipping_company, shipping_number,
                is_confirm_order, refund_request_date, refund_complete_date, refund_reason_id,
                refund_amount, refund_shipping_fee, detail_reason, bank, account_holder,
                account_number, cancel_reason_id, complete_cancellation_date,
                start_date, end_date, modifier_id
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
                $21, $22, $23, $24, $25, $26, $27, $28, $29
            )
            RETURNING id
            "#,
        )
        .bind(r.order_detail_id)
        .bind(r.order_id)
        .bind(r.order_status_id.id())
        .bind(r.product_id)
        .bind(r.price)
        .bind(&r.option_color)
        .bind(&r.option_size)
        .bind(r.option_additional_price)
        .bind(r.units)
        .bind(r.discount_price)
        .bind(r.shipping_start_date)
        .bind(r.shipping_complete_date)
        .bind(&r.shipping_company)
        .bind(&r.shipping_number)
        .bind(r.is_confirm_order)
        .bind(r.refund_request_date)
        .bind(r.refund_complete_date)
        .bind(r.refund_reason_id)
        .bind(r.refund_amount)
        .bind(r.refund_shipping_fee)
        .bind(&r.detail_reason)
        .bind(&r.bank)
        .bind(&r.account_holder)
        .bind(&r.account_number)
        .bind(r.cancel_reason_id)
        .bind(r.complete_cancellation_date)
        .bind(r.start_date)
        .bind(r.end_date)
        .bind(r.modifier_id)
        .fetch_one(&mut *self.conn)
        .await?;
        Ok(id)
    }

    async fn status_before_refund(
        &mut self,
        line_id: i64,
        before: NaiveDateTime,
    ) -> HistoryResult<Option<OrderStatus>> {
        let sql = format!(
            r#"
            SELECT order_status_id FROM order_item_info
            WHERE order_detail_id = $1 AND end_date <= $2 AND order_status_id <> $3 AND {}
            ORDER BY end_date DESC, id DESC
            LIMIT 1
            "#,
            live(""),
        );
        let row: Option<(i32,)> = sqlx::query_as(&sql)
            .bind(line_id)
            .bind(before)
            .bind(OrderStatus::RefundRequested.id())
            .fetch_optional(&mut *self.conn)
            .await?;

        row.map(|(status,)| {
            OrderStatus::try_from(status)
                .map_err(|e| super::error::HistoryError::InvalidStatus(e.0))
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_skips_deleted_lines() {
        let sql = lock_open_sql();
        assert!(sql.contains("end_date = $2 AND is_deleted = FALSE FOR UPDATE"));
    }
}
