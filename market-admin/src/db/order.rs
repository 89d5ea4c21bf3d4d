//! Order queries
//!
//! Every read works on the open interval of `order_item_info`, joined with the
//! current product snapshot and the open seller profile.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    OrderDetail, OrderDetailUpdate, OrderHistoryEntry, OrderListItem, OrderListQuery, OrderStatus,
};
use shared::pagination::Page;
use shared::util::{OPEN_END_SQL, open_end};
use sqlx::{PgConnection, PgPool};

use super::query::{QueryBuilder, latest_product_info, live, lookup};
use crate::util::parse_id_list;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_LIMIT: u32 = 50;

/// Free-text search targets
const SEARCH_TARGETS: &[(&str, &str)] = &[
    ("ORDER_NO", "CAST(oi.order_id AS TEXT)"),
    ("ORDER_LINE_NO", "CAST(oi.order_detail_id AS TEXT)"),
    ("ORDERER_NAME", "o.orderer_name"),
    ("ORDERER_PHONE", "o.orderer_phone"),
    ("SELLER_NAME", "s.korean_name"),
    ("PRODUCT_NAME", "pi.name"),
];

const SORT_KEYS: &[(&str, &str)] = &[
    ("NEW", "o.payment_date DESC"),
    ("OLD", "o.payment_date ASC"),
    ("NEW_DELIVERY", "oi.shipping_start_date DESC"),
    ("OLD_DELIVERY", "oi.shipping_start_date ASC"),
    ("NEW_DELIVERY_COMPLETE", "oi.shipping_complete_date DESC"),
    ("OLD_DELIVERY_COMPLETE", "oi.shipping_complete_date ASC"),
    ("NEW_REQUEST_REFUND", "oi.refund_request_date DESC"),
    ("OLD_REQUEST_REFUND", "oi.refund_request_date ASC"),
    ("NEW_REFUND_COMPLETE", "oi.refund_complete_date DESC"),
    ("OLD_REFUND_COMPLETE", "oi.refund_complete_date ASC"),
    ("NEW_CANCEL_COMPLETE", "oi.complete_cancellation_date DESC"),
    ("OLD_CANCEL_COMPLETE", "oi.complete_cancellation_date ASC"),
];

/// Insertion order when no sort key is given
const DEFAULT_ORDER: &str = "oi.id ASC";

fn from_clause() -> String {
    format!(
        r#"
        FROM order_item_info AS oi
        JOIN orders AS o ON o.id = oi.order_id AND {live_order}{product}
        JOIN seller_info AS s ON s.seller_id = pi.seller_id AND s.end_date = {OPEN_END_SQL}
        "#,
        live_order = live("o"),
        product = latest_product_info("oi.product_id", "name, seller_id"),
    )
}

/// Validated order list filter
#[derive(Debug)]
pub struct OrderFilter {
    builder: QueryBuilder,
    order_by: &'static str,
    page: Page,
}

impl OrderFilter {
    /// Validate the query string and turn it into predicates.
    /// Unknown search targets, sort keys and statuses are rejected here.
    pub fn from_query(q: &OrderListQuery) -> Result<Self, AppError> {
        let status = OrderStatus::try_from(q.order_status).map_err(|e| {
            AppError::new(ErrorCode::OrderStatusInvalid).with_detail("order_status", e.0)
        })?;

        let mut builder = QueryBuilder::new();
        builder
            .add_condition(&format!("oi.end_date = {OPEN_END_SQL}"))
            .live("oi")
            .eq_i32("oi.order_status_id", status.id());

        if let Some(target) = q.search_target.as_deref().filter(|t| !t.is_empty()) {
            let column = lookup(SEARCH_TARGETS, target).ok_or_else(|| {
                AppError::new(ErrorCode::UnknownFilterTarget).with_detail("search_target", target)
            })?;
            if let Some(keyword) = q.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
                builder.contains(column, keyword);
            }
        }

        if let Some(number) = q.shipping_number.as_deref().filter(|n| !n.is_empty()) {
            builder.contains("oi.shipping_number", number);
        }
        if let Some(reason) = q.refund_reason_id {
            builder.eq_i32("oi.refund_reason_id", reason);
        }
        if let Some(reason) = q.cancel_reason_id {
            builder.eq_i32("oi.cancel_reason_id", reason);
        }
        builder.date_range("o.payment_date", q.paid_from, q.paid_to);

        if let Some(raw) = q.seller_attribute_ids.as_deref() {
            let ids = parse_id_list(raw).map_err(|_| {
                AppError::new(ErrorCode::InvalidFormat).with_detail("seller_attribute_ids", raw)
            })?;
            builder.any_i32("s.seller_attribute_id", ids);
        }

        let order_by = match q.sort.as_deref().filter(|s| !s.is_empty()) {
            Some(key) => lookup(SORT_KEYS, key).ok_or_else(|| {
                AppError::new(ErrorCode::UnknownSortKey).with_detail("sort", key)
            })?,
            None => DEFAULT_ORDER,
        };

        Ok(Self {
            builder,
            order_by,
            page: Page::resolve(q.page, q.limit, DEFAULT_LIMIT),
        })
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Limit the view to lines whose product belongs to `seller_id`.
    pub fn restrict_to_seller(&mut self, seller_id: i64) {
        self.builder.eq_i64("pi.seller_id", seller_id);
    }

    fn list_sql(&self) -> String {
        format!(
            r#"
            SELECT
                o.payment_date,
                oi.shipping_start_date,
                oi.shipping_complete_date,
                oi.refund_request_date,
                oi.refund_complete_date,
                oi.complete_cancellation_date,
                o.id AS order_id,
                oi.order_detail_id,
                oi.id AS order_item_id,
                s.korean_name AS seller_name,
                pi.name AS product_name,
                oi.option_color,
                oi.option_size,
                oi.option_additional_price,
                oi.units,
                o.orderer_name,
                o.orderer_phone,
                o.total_payment,
                oi.discount_price,
                oi.refund_reason_id,
                oi.cancel_reason_id,
                oi.refund_amount
            {from}{where_clause}
            ORDER BY {order_by}{page}
            "#,
            from = from_clause(),
            where_clause = self.builder.build_where_clause(),
            order_by = self.order_by,
            page = self.builder.page_clause(),
        )
    }

    fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) {}{}",
            from_clause(),
            self.builder.build_where_clause()
        )
    }
}

pub async fn list_orders(
    pool: &PgPool,
    filter: &OrderFilter,
) -> Result<Vec<OrderListItem>, BoxError> {
    let sql = filter.list_sql();
    let query = filter
        .builder
        .apply_bindings(sqlx::query_as::<_, OrderListItem>(&sql));
    let rows = QueryBuilder::apply_page(query, filter.page)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_orders(pool: &PgPool, filter: &OrderFilter) -> Result<i64, BoxError> {
    let sql = filter.count_sql();
    let count = filter
        .builder
        .apply_bindings_scalar(sqlx::query_scalar::<_, i64>(&sql))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Open interval of one line with its order header
pub async fn get_detail(pool: &PgPool, line_id: i64) -> Result<Option<OrderDetail>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            o.payment_date,
            oi.shipping_start_date,
            oi.shipping_complete_date,
            oi.refund_request_date,
            oi.refund_complete_date,
            oi.complete_cancellation_date,
            o.id AS order_id,
            oi.id AS order_item_id,
            oi.order_detail_id,
            s.korean_name AS seller_name,
            pi.name AS product_name,
            oi.option_color,
            oi.option_size,
            oi.option_additional_price,
            oi.units,
            o.user_id,
            o.orderer_name,
            o.orderer_phone,
            oi.shipping_number,
            oi.shipping_company,
            o.receiver_name,
            o.receiver_phone,
            o.receiver_address,
            o.shipping_memo,
            o.total_payment,
            oi.discount_price,
            oi.refund_reason_id,
            oi.cancel_reason_id,
            oi.refund_amount,
            oi.bank,
            oi.account_holder,
            oi.account_number,
            oi.order_status_id,
            st.status_name AS order_status_name
        {from}
        JOIN order_status AS st ON st.id = oi.order_status_id
        WHERE oi.order_detail_id = $1 AND oi.end_date = $2 AND {live_line}
        "#,
        from = from_clause(),
        live_line = live("oi"),
    );
    let row = sqlx::query_as::<_, OrderDetail>(&sql)
        .bind(line_id)
        .bind(open_end())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Every interval of one line, oldest first
pub async fn list_history(
    pool: &PgPool,
    line_id: i64,
) -> Result<Vec<OrderHistoryEntry>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            oi.order_status_id,
            st.status_name,
            oi.start_date AS valid_from,
            oi.end_date AS valid_to
        FROM order_item_info AS oi
        JOIN order_status AS st ON st.id = oi.order_status_id
        WHERE oi.order_detail_id = $1 AND {}
        ORDER BY oi.start_date ASC, oi.id ASC
        "#,
        live("oi"),
    );
    let rows = sqlx::query_as::<_, OrderHistoryEntry>(&sql)
        .bind(line_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// In-place edit of the order header owning `line_id`. Absent fields are kept.
pub async fn update_order_header(
    conn: &mut PgConnection,
    line_id: i64,
    change: &OrderDetailUpdate,
) -> Result<u64, BoxError> {
    let sql = format!(
        r#"
        UPDATE orders SET
            orderer_phone = COALESCE($1, orderer_phone),
            receiver_phone = COALESCE($2, receiver_phone),
            receiver_address = COALESCE($3, receiver_address)
        WHERE {live} AND id = (
            SELECT order_id FROM order_item_info
            WHERE order_detail_id = $4 AND end_date = $5 AND {live}
        )
        "#,
        live = live(""),
    );
    let result = sqlx::query(&sql)
        .bind(&change.orderer_phone)
        .bind(&change.receiver_phone)
        .bind(&change.receiver_address)
        .bind(line_id)
        .bind(open_end())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// In-place edit of the open interval; no new history row is created.
pub async fn update_open_line(
    conn: &mut PgConnection,
    line_id: i64,
    change: &OrderDetailUpdate,
) -> Result<u64, BoxError> {
    let sql = format!(
        r#"
        UPDATE order_item_info SET
            bank = COALESCE($1, bank),
            account_number = COALESCE($2, account_number),
            account_holder = COALESCE($3, account_holder),
            shipping_company = COALESCE($4, shipping_company),
            shipping_number = COALESCE($5, shipping_number)
        WHERE order_detail_id = $6 AND end_date = $7 AND {}
        "#,
        live(""),
    );
    let result = sqlx::query(&sql)
        .bind(&change.refund_bank)
        .bind(&change.refund_account_number)
        .bind(&change.refund_account_holder)
        .bind(&change.shipping_company)
        .bind(&change.shipping_number)
        .bind(line_id)
        .bind(open_end())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// First line in `line_ids` whose current product belongs to another seller.
pub async fn first_foreign_line(
    pool: &PgPool,
    line_ids: &[i64],
    seller_id: i64,
) -> Result<Option<i64>, BoxError> {
    let sql = format!(
        r#"
        SELECT oi.order_detail_id
        FROM order_item_info AS oi{product}
        WHERE oi.order_detail_id = ANY($1)
          AND oi.end_date = {OPEN_END_SQL}
          AND {live_line}
          AND pi.seller_id <> $2
        ORDER BY oi.order_detail_id
        LIMIT 1
        "#,
        product = latest_product_info("oi.product_id", "seller_id"),
        live_line = live("oi"),
    );
    let row: Option<(i64,)> = sqlx::query_as(&sql)
        .bind(line_ids)
        .bind(seller_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(status: i32) -> OrderListQuery {
        OrderListQuery {
            order_status: status,
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_filter_restricts_to_open_rows() {
        let filter = OrderFilter::from_query(&query(2)).unwrap();
        let sql = filter.list_sql();
        assert!(sql.contains("WHERE oi.end_date = TIMESTAMP '9999-12-31 23:59:59'"));
        assert!(sql.contains("AND oi.is_deleted = FALSE AND oi.order_status_id = $1"));
        assert!(sql.contains("JOIN orders AS o ON o.id = oi.order_id AND o.is_deleted = FALSE"));
        assert!(sql.contains("WHERE product_id = oi.product_id AND is_deleted = FALSE"));
        assert!(sql.contains("ORDER BY oi.id ASC"));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
        assert_eq!(filter.page(), Page { page: 1, limit: 50 });
    }

    #[test]
    fn test_every_filter_adds_one_predicate() {
        let q = OrderListQuery {
            order_status: 5,
            search_target: Some("ORDERER_NAME".into()),
            keyword: Some("kim".into()),
            shipping_number: Some("6301".into()),
            refund_reason_id: Some(2),
            cancel_reason_id: Some(4),
            paid_from: chrono::NaiveDate::from_ymd_opt(2024, 1, 1),
            paid_to: chrono::NaiveDate::from_ymd_opt(2024, 1, 31),
            seller_attribute_ids: Some("1,2".into()),
            sort: Some("NEW_REQUEST_REFUND".into()),
            limit: Some(20),
            page: Some(3),
        };
        let filter = OrderFilter::from_query(&q).unwrap();
        let sql = filter.list_sql();
        assert!(sql.contains("o.orderer_name ILIKE $2"));
        assert!(sql.contains("oi.shipping_number ILIKE $3"));
        assert!(sql.contains("oi.refund_reason_id = $4"));
        assert!(sql.contains("oi.cancel_reason_id = $5"));
        assert!(sql.contains("o.payment_date >= $6"));
        assert!(sql.contains("o.payment_date < $7"));
        assert!(sql.contains("s.seller_attribute_id = ANY($8)"));
        assert!(sql.contains("ORDER BY oi.refund_request_date DESC"));
        assert!(sql.contains("LIMIT $9 OFFSET $10"));
        assert_eq!(filter.page().offset(), 40);

        // count shares the predicates, not the ordering or paging
        let count = filter.count_sql();
        assert!(count.contains("s.seller_attribute_id = ANY($8)"));
        assert!(!count.contains("ORDER BY oi."));
        assert!(!count.contains("LIMIT $"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut q = query(1);
        q.search_target = Some("C_ORDER_CD; DROP".into());
        let err = OrderFilter::from_query(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFilterTarget);

        let mut q = query(1);
        q.sort = Some("RANDOM".into());
        let err = OrderFilter::from_query(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSortKey);

        let err = OrderFilter::from_query(&query(0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderStatusInvalid);

        let mut q = query(1);
        q.seller_attribute_ids = Some("1,a".into());
        let err = OrderFilter::from_query(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_seller_restriction_is_numbered_before_paging() {
        let mut filter = OrderFilter::from_query(&query(3)).unwrap();
        filter.restrict_to_seller(42);
        let sql = filter.list_sql();
        assert!(sql.contains("pi.seller_id = $2"));
        assert!(sql.contains("LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn test_target_without_keyword_adds_nothing() {
        let mut q = query(1);
        q.search_target = Some("PRODUCT_NAME".into());
        let filter = OrderFilter::from_query(&q).unwrap();
        assert!(!filter.list_sql().contains("pi.name ILIKE"));
    }
}
