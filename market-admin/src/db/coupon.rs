//! Coupon queries

use chrono::NaiveDateTime;
use shared::models::{CouponCreate, CouponDetail, CouponListQuery, CouponSummary, CouponUpdate};
use shared::pagination::Page;
use sqlx::{PgConnection, PgPool};

use super::query::{QueryBuilder, live};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coupon list page size; not caller-configurable
pub const PAGE_SIZE: u32 = 10;

const LIST_FROM: &str = r#"
    FROM coupons AS c
    JOIN coupon_issue_types AS t ON t.id = c.issue_type_id
"#;

pub fn list_filter(q: &CouponListQuery) -> QueryBuilder {
    let mut builder = QueryBuilder::new();
    builder.live("c");
    if let Some(id) = q.coupon_id {
        builder.eq_i64("c.id", id);
    }
    if let Some(name) = q.coupon_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        builder.contains("c.coupon_name", name);
    }
    builder
        .date_range(
            "c.validation_start_date",
            q.validation_start_from,
            q.validation_start_to,
        )
        .date_range(
            "c.validation_end_date",
            q.validation_end_from,
            q.validation_end_to,
        )
        .date_range(
            "c.download_start_date",
            q.download_start_from,
            q.download_start_to,
        )
        .date_range("c.download_end_date", q.download_end_from, q.download_end_to);
    if let Some(issue_type) = q.issue_type_id {
        builder.eq_i32("c.issue_type_id", issue_type);
    }
    if let Some(limited) = q.is_limited {
        builder.eq_bool("c.is_limited", limited);
    }
    builder
}

pub async fn list_coupons(
    pool: &PgPool,
    builder: &QueryBuilder,
    page: Page,
) -> Result<Vec<CouponSummary>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            c.id AS coupon_id,
            c.coupon_name,
            c.discount_price,
            c.validation_start_date,
            c.validation_end_date,
            c.download_start_date,
            c.download_end_date,
            t.type_name AS issue_type_name,
            c.is_limited,
            c.maximum_number,
            c.issue_number,
            c.used_number
        {LIST_FROM}{where_clause}
        ORDER BY c.id DESC{page}
        "#,
        where_clause = builder.build_where_clause(),
        page = builder.page_clause(),
    );
    let query = builder.apply_bindings(sqlx::query_as::<_, CouponSummary>(&sql));
    let rows = QueryBuilder::apply_page(query, page).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn count_coupons(pool: &PgPool, builder: &QueryBuilder) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) {LIST_FROM}{}", builder.build_where_clause());
    let count = builder
        .apply_bindings_scalar(sqlx::query_scalar::<_, i64>(&sql))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_detail(pool: &PgPool, coupon_id: i64) -> Result<Option<CouponDetail>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            id, coupon_name, validation_start_date, validation_end_date,
            download_start_date, download_end_date, is_limited, maximum_number,
            discount_price, issue_type_id, issue_method_id, description, min_cost
        FROM coupons
        WHERE id = $1 AND {}
        "#,
        live(""),
    );
    let row = sqlx::query_as::<_, CouponDetail>(&sql)
        .bind(coupon_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a coupon; issue and use counters start at zero.
pub async fn create(
    conn: &mut PgConnection,
    coupon: &CouponCreate,
    now: NaiveDateTime,
) -> Result<i64, BoxError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO coupons (
            coupon_name, validation_start_date, validation_end_date,
            download_start_date, download_end_date, is_limited, used_number,
            maximum_number, issue_number, issue_type_id, issue_method_id,
            description, discount_price, min_cost, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, 0, $7, 0, $8, $9, $10, $11, $12, $13)
        RETURNING id
        "#,
    )
    .bind(&coupon.coupon_name)
    .bind(coupon.validation_start_date)
    .bind(coupon.validation_end_date)
    .bind(coupon.download_start_date)
    .bind(coupon.download_end_date)
    .bind(coupon.is_limited)
    .bind(coupon.maximum_number)
    .bind(coupon.issue_type_id)
    .bind(coupon.issue_method_id)
    .bind(&coupon.description)
    .bind(coupon.discount_price)
    .bind(coupon.min_cost)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn update(
    conn: &mut PgConnection,
    coupon_id: i64,
    change: &CouponUpdate,
) -> Result<u64, BoxError> {
    let sql = format!(
        "UPDATE coupons SET coupon_name = $1, description = $2 WHERE id = $3 AND {}",
        live(""),
    );
    let result = sqlx::query(&sql)
        .bind(&change.coupon_name)
        .bind(&change.description)
        .bind(coupon_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn soft_delete(conn: &mut PgConnection, coupon_id: i64) -> Result<u64, BoxError> {
    let sql = format!("UPDATE coupons SET is_deleted = TRUE WHERE id = $1 AND {}", live(""));
    let result = sqlx::query(&sql).bind(coupon_id).execute(&mut *conn).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_list_filter_date_ranges() {
        let q = CouponListQuery {
            coupon_name: Some("welcome".into()),
            download_start_from: NaiveDate::from_ymd_opt(2024, 5, 1),
            is_limited: Some(true),
            ..Default::default()
        };
        let builder = list_filter(&q);
        assert_eq!(
            builder.build_where_clause(),
            " WHERE c.is_deleted = FALSE AND c.coupon_name ILIKE $1 \
             AND c.download_start_date >= $2 AND c.is_limited = $3"
        );
        assert_eq!(builder.page_clause(), " LIMIT $4 OFFSET $5");
    }
}
