//! Order and order-line history models
//!
//! An order line keeps its whole status history in `order_item_info`: every
//! row is one validity interval `[start_date, end_date)`, and the row whose
//! `end_date` equals the open sentinel is the current state of the line.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order line status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum OrderStatus {
    PaymentComplete = 1,
    Preparing = 2,
    Shipping = 3,
    Delivered = 4,
    RefundRequested = 5,
    RefundComplete = 6,
    CancelComplete = 7,
}

impl OrderStatus {
    pub const fn id(self) -> i32 {
        self as i32
    }

    /// Refund-complete and cancel-complete lines never transition again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::RefundComplete | Self::CancelComplete)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PaymentComplete => "payment complete",
            Self::Preparing => "preparing",
            Self::Shipping => "shipping",
            Self::Delivered => "delivered",
            Self::RefundRequested => "refund requested",
            Self::RefundComplete => "refund complete",
            Self::CancelComplete => "cancel complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidOrderStatus(pub i32);

impl fmt::Display for InvalidOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid order status: {}", self.0)
    }
}

impl std::error::Error for InvalidOrderStatus {}

impl TryFrom<i32> for OrderStatus {
    type Error = InvalidOrderStatus;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::PaymentComplete),
            2 => Ok(Self::Preparing),
            3 => Ok(Self::Shipping),
            4 => Ok(Self::Delivered),
            5 => Ok(Self::RefundRequested),
            6 => Ok(Self::RefundComplete),
            7 => Ok(Self::CancelComplete),
            other => Err(InvalidOrderStatus(other)),
        }
    }
}

impl From<OrderStatus> for i32 {
    fn from(status: OrderStatus) -> Self {
        status.id()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One validity interval of an order line (a full `order_item_info` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLineRecord {
    /// Row id of this interval
    pub id: i64,
    /// Line identity, stable across all intervals of the line
    pub order_detail_id: i64,
    pub order_id: i64,
    #[cfg_attr(feature = "db", sqlx(try_from = "i32"))]
    pub order_status_id: OrderStatus,
    pub product_id: i64,
    pub price: Decimal,
    pub option_color: Option<String>,
    pub option_size: Option<String>,
    pub option_additional_price: Decimal,
    pub units: i32,
    pub discount_price: Decimal,
    pub shipping_start_date: Option<NaiveDateTime>,
    pub shipping_complete_date: Option<NaiveDateTime>,
    pub shipping_company: Option<String>,
    pub shipping_number: Option<String>,
    pub is_confirm_order: bool,
    pub refund_request_date: Option<NaiveDateTime>,
    pub refund_complete_date: Option<NaiveDateTime>,
    pub refund_reason_id: Option<i32>,
    pub refund_amount: Option<Decimal>,
    pub refund_shipping_fee: Option<Decimal>,
    pub detail_reason: Option<String>,
    pub bank: Option<String>,
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub cancel_reason_id: Option<i32>,
    pub complete_cancellation_date: Option<NaiveDateTime>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub modifier_id: Option<i64>,
}

/// Row of the order list view (open interval joined with order, product and seller)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderListItem {
    pub payment_date: NaiveDateTime,
    pub shipping_start_date: Option<NaiveDateTime>,
    pub shipping_complete_date: Option<NaiveDateTime>,
    pub refund_request_date: Option<NaiveDateTime>,
    pub refund_complete_date: Option<NaiveDateTime>,
    pub complete_cancellation_date: Option<NaiveDateTime>,
    pub order_id: i64,
    pub order_detail_id: i64,
    pub order_item_id: i64,
    pub seller_name: String,
    pub product_name: String,
    pub option_color: Option<String>,
    pub option_size: Option<String>,
    pub option_additional_price: Decimal,
    pub units: i32,
    pub orderer_name: String,
    pub orderer_phone: String,
    pub total_payment: Decimal,
    pub discount_price: Decimal,
    pub refund_reason_id: Option<i32>,
    pub cancel_reason_id: Option<i32>,
    pub refund_amount: Option<Decimal>,
}

/// Order line detail (open interval plus order header)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderDetail {
    pub payment_date: NaiveDateTime,
    pub shipping_start_date: Option<NaiveDateTime>,
    pub shipping_complete_date: Option<NaiveDateTime>,
    pub refund_request_date: Option<NaiveDateTime>,
    pub refund_complete_date: Option<NaiveDateTime>,
    pub complete_cancellation_date: Option<NaiveDateTime>,
    pub order_id: i64,
    pub order_item_id: i64,
    pub order_detail_id: i64,
    pub seller_name: String,
    pub product_name: String,
    pub option_color: Option<String>,
    pub option_size: Option<String>,
    pub option_additional_price: Decimal,
    pub units: i32,
    pub user_id: i64,
    pub orderer_name: String,
    pub orderer_phone: String,
    pub shipping_number: Option<String>,
    pub shipping_company: Option<String>,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub shipping_memo: Option<String>,
    pub total_payment: Decimal,
    pub discount_price: Decimal,
    pub refund_reason_id: Option<i32>,
    pub cancel_reason_id: Option<i32>,
    pub refund_amount: Option<Decimal>,
    pub bank: Option<String>,
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub order_status_id: i32,
    pub order_status_name: String,
}

/// One entry of an order line's status history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderHistoryEntry {
    pub order_status_id: i32,
    pub status_name: String,
    pub valid_from: NaiveDateTime,
    pub valid_to: NaiveDateTime,
}

/// GET /api/orders query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub order_status: i32,
    /// One of `ORDER_NO`, `ORDER_LINE_NO`, `ORDERER_NAME`, `ORDERER_PHONE`,
    /// `SELLER_NAME`, `PRODUCT_NAME`
    pub search_target: Option<String>,
    pub keyword: Option<String>,
    pub shipping_number: Option<String>,
    pub refund_reason_id: Option<i32>,
    pub cancel_reason_id: Option<i32>,
    pub paid_from: Option<NaiveDate>,
    pub paid_to: Option<NaiveDate>,
    /// Comma separated seller attribute ids, e.g. `1,2,5`
    pub seller_attribute_ids: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

/// Batch status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeStatusRequest {
    pub line_ids: Vec<i64>,
    pub next_status: i32,
}

/// Batch cancel; `cancel_reason_ids[i]` belongs to `line_ids[i]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    pub line_ids: Vec<i64>,
    pub cancel_reason_ids: Vec<i32>,
}

/// Batch refund request; every list is positionally aligned with `line_ids`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequestRequest {
    pub line_ids: Vec<i64>,
    pub refund_reason_ids: Vec<i32>,
    pub refund_detail_reasons: Vec<Option<String>>,
    pub refund_amounts: Vec<Decimal>,
}

/// Batch operation that only needs line ids (complete refund, withdraw refund)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineIdsRequest {
    pub line_ids: Vec<i64>,
}

/// In-place corrections; none of these open a new history interval.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDetailUpdate {
    pub orderer_phone: Option<String>,
    pub receiver_phone: Option<String>,
    pub receiver_address: Option<String>,
    pub refund_bank: Option<String>,
    pub refund_account_number: Option<String>,
    pub refund_account_holder: Option<String>,
    pub shipping_company: Option<String>,
    pub shipping_number: Option<String>,
}

impl OrderDetailUpdate {
    pub fn touches_order(&self) -> bool {
        self.orderer_phone.is_some()
            || self.receiver_phone.is_some()
            || self.receiver_address.is_some()
    }

    pub fn touches_line(&self) -> bool {
        self.refund_bank.is_some()
            || self.refund_account_number.is_some()
            || self.refund_account_holder.is_some()
            || self.shipping_company.is_some()
            || self.shipping_number.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderListItem>,
    pub total_count: i64,
    pub page: u32,
    pub limit: u32,
}

/// Line detail with its full status history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetailResponse {
    pub order: OrderDetail,
    pub history: Vec<OrderHistoryEntry>,
}

/// Result of a batch transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResult {
    pub transitioned: usize,
    pub valid_from: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_through_i32() {
        for id in 1..=7 {
            let status = OrderStatus::try_from(id).unwrap();
            assert_eq!(status.id(), id);
        }
        assert_eq!(OrderStatus::try_from(0), Err(InvalidOrderStatus(0)));
        assert_eq!(OrderStatus::try_from(8), Err(InvalidOrderStatus(8)));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::RefundComplete.is_terminal());
        assert!(OrderStatus::CancelComplete.is_terminal());
        assert!(!OrderStatus::RefundRequested.is_terminal());
        assert!(!OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_status_serializes_as_number() {
        assert_eq!(serde_json::to_string(&OrderStatus::Shipping).unwrap(), "3");
        assert!(serde_json::from_str::<OrderStatus>("9").is_err());
    }

    #[test]
    fn test_detail_update_scopes() {
        let update = OrderDetailUpdate {
            receiver_address: Some("Seoul".into()),
            ..Default::default()
        };
        assert!(update.touches_order());
        assert!(!update.touches_line());

        let update = OrderDetailUpdate {
            shipping_number: Some("123".into()),
            ..Default::default()
        };
        assert!(!update.touches_order());
        assert!(update.touches_line());
    }
}
