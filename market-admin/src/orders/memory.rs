//! In-memory `LineHistoryStore` for engine tests

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shared::models::{OrderLineRecord, OrderStatus};
use shared::util::{is_open, open_end};

use super::error::HistoryResult;
use super::store::LineHistoryStore;

#[derive(Debug, Default, Clone)]
pub struct MemoryLineHistory {
    rows: Vec<OrderLineRecord>,
}

impl MemoryLineHistory {
    /// Add the first interval of a line.
    pub fn seed(&mut self, line_id: i64, status: OrderStatus, start: NaiveDateTime) {
        let id = self.rows.len() as i64 + 1;
        self.rows.push(OrderLineRecord {
            id,
            order_detail_id: line_id,
            order_id: line_id / 10 + 1,
            order_status_id: status,
            product_id: 77,
            price: Decimal::new(32000, 0),
            option_color: Some("black".into()),
            option_size: Some("M".into()),
            option_additional_price: Decimal::ZERO,
            units: 1,
            discount_price: Decimal::new(3000, 0),
            shipping_start_date: None,
            shipping_complete_date: None,
            shipping_company: Some("CJ".into()),
            shipping_number: Some("6301-2299-1844".into()),
            is_confirm_order: false,
            refund_request_date: None,
            refund_complete_date: None,
            refund_reason_id: None,
            refund_amount: None,
            refund_shipping_fee: None,
            detail_reason: None,
            bank: None,
            account_holder: None,
            account_number: None,
            cancel_reason_id: None,
            complete_cancellation_date: None,
            start_date: start,
            end_date: open_end(),
            modifier_id: Some(1),
        });
    }

    pub fn open_row(&self, line_id: i64) -> Option<OrderLineRecord> {
        self.rows
            .iter()
            .find(|r| r.order_detail_id == line_id && is_open(r.end_date))
            .cloned()
    }

    /// All intervals of a line ordered by start
    pub fn history(&self, line_id: i64) -> Vec<OrderLineRecord> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .filter(|r| r.order_detail_id == line_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.start_date, r.id));
        rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[async_trait]
impl LineHistoryStore for MemoryLineHistory {
    async fn lock_open(&mut self, line_id: i64) -> HistoryResult<Option<OrderLineRecord>> {
        Ok(self.open_row(line_id))
    }

    async fn close(&mut self, record_id: i64, at: NaiveDateTime) -> HistoryResult<u64> {
        match self
            .rows
            .iter_mut()
            .find(|r| r.id == record_id && is_open(r.end_date))
        {
            Some(row) => {
                row.end_date = at;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn insert(&mut self, record: &OrderLineRecord) -> HistoryResult<i64> {
        let id = self.rows.len() as i64 + 1;
        self.rows.push(OrderLineRecord {
            id,
            ..record.clone()
        });
        Ok(id)
    }

    async fn status_before_refund(
        &mut self,
        line_id: i64,
        before: NaiveDateTime,
    ) -> HistoryResult<Option<OrderStatus>> {
        Ok(self
            .rows
            .iter()
            .filter(|r| {
                r.order_detail_id == line_id
                    && r.end_date <= before
                    && r.order_status_id != OrderStatus::RefundRequested
            })
            .max_by_key(|r| (r.end_date, r.id))
            .map(|r| r.order_status_id))
    }
}
