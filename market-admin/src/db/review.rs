//! Review queries

use shared::error::{AppError, ErrorCode};
use shared::models::{ReviewDetail, ReviewListQuery, ReviewSummary};
use shared::pagination::Page;
use shared::util::OPEN_END_SQL;
use sqlx::{PgConnection, PgPool};

use super::query::{QueryBuilder, latest_product_info, live, lookup};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_LIMIT: u32 = 10;

const SORT_KEYS: &[(&str, &str)] = &[
    ("NEW_REGIST", "r.created_at DESC, r.id DESC"),
    ("NEW_EDIT", "r.updated_at DESC NULLS LAST, r.id DESC"),
];

const DEFAULT_ORDER: &str = "r.id DESC";

fn from_clause() -> String {
    format!(
        r#"
        FROM reviews AS r
        JOIN users AS u ON u.id = r.user_id
        JOIN order_item_info AS oi ON oi.id = r.order_item_info_id{product}
        JOIN seller_info AS s ON s.seller_id = pi.seller_id AND s.end_date = {OPEN_END_SQL}
        "#,
        product = latest_product_info("oi.product_id", "name, seller_id"),
    )
}

fn base_builder() -> QueryBuilder {
    let mut builder = QueryBuilder::new();
    builder.live("r");
    builder
}

/// Validated review list filter
#[derive(Debug)]
pub struct ReviewFilter {
    builder: QueryBuilder,
    order_by: &'static str,
    page: Page,
}

impl ReviewFilter {
    pub fn from_query(q: &ReviewListQuery) -> Result<Self, AppError> {
        let mut builder = base_builder();
        if let Some(content) = q.content.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            builder.contains("r.content", content);
        }
        if let Some(id) = q.review_id {
            builder.eq_i64("r.id", id);
        }
        if let Some(login) = q.member_login_id.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            builder.contains("u.login_id", login);
        }
        builder
            .date_range("r.created_at", q.registered_from, q.registered_to)
            .date_range("r.updated_at", q.updated_from, q.updated_to);

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

    pub fn restrict_to_seller(&mut self, seller_id: i64) {
        self.builder.eq_i64("pi.seller_id", seller_id);
    }
}

pub async fn list_reviews(
    pool: &PgPool,
    filter: &ReviewFilter,
) -> Result<Vec<ReviewSummary>, BoxError> {
    let builder = &filter.builder;
    let sql = format!(
        r#"
        SELECT
            r.id AS review_id,
            s.korean_name AS seller_name,
            oi.product_id,
            pi.name AS product_name,
            u.login_id,
            r.content,
            r.created_at,
            r.updated_at
        {from}{where_clause}
        ORDER BY {order_by}{page}
        "#,
        from = from_clause(),
        where_clause = builder.build_where_clause(),
        order_by = filter.order_by,
        page = builder.page_clause(),
    );
    let query = builder.apply_bindings(sqlx::query_as::<_, ReviewSummary>(&sql));
    let rows = QueryBuilder::apply_page(query, filter.page)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_reviews(pool: &PgPool, filter: &ReviewFilter) -> Result<i64, BoxError> {
    count_with(pool, &filter.builder).await
}

/// Live reviews, optionally only those on `seller_id`'s products
pub async fn count_all(pool: &PgPool, seller_id: Option<i64>) -> Result<i64, BoxError> {
    let mut builder = base_builder();
    if let Some(id) = seller_id {
        builder.eq_i64("pi.seller_id", id);
    }
    count_with(pool, &builder).await
}

async fn count_with(pool: &PgPool, builder: &QueryBuilder) -> Result<i64, BoxError> {
    let sql = format!(
        "SELECT COUNT(*) {}{}",
        from_clause(),
        builder.build_where_clause()
    );
    let count = builder
        .apply_bindings_scalar(sqlx::query_scalar::<_, i64>(&sql))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn get_detail(pool: &PgPool, review_id: i64) -> Result<Option<ReviewDetail>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            r.id AS review_id,
            oi.product_id,
            pi.name AS product_name,
            u.login_id,
            r.rating,
            r.content,
            r.image_url,
            r.created_at,
            r.updated_at
        {from}
        WHERE r.id = $1 AND {live_review}
        "#,
        from = from_clause(),
        live_review = live("r"),
    );
    let row = sqlx::query_as::<_, ReviewDetail>(&sql)
        .bind(review_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Seller owning the reviewed product
pub async fn review_owner(pool: &PgPool, review_id: i64) -> Result<Option<i64>, BoxError> {
    let sql = format!(
        "SELECT pi.seller_id {} WHERE r.id = $1 AND {}",
        from_clause(),
        live("r"),
    );
    let owner = sqlx::query_scalar::<_, i64>(&sql)
        .bind(review_id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

pub async fn soft_delete(conn: &mut PgConnection, review_id: i64) -> Result<u64, BoxError> {
    let sql = format!(
        "UPDATE reviews SET is_deleted = TRUE WHERE id = $1 AND {}",
        live("")
    );
    let result = sqlx::query(&sql)
        .bind(review_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_keys() {
        let q = ReviewListQuery {
            sort: Some("NEW_EDIT".into()),
            ..Default::default()
        };
        let filter = ReviewFilter::from_query(&q).unwrap();
        assert_eq!(filter.order_by, "r.updated_at DESC NULLS LAST, r.id DESC");

        let q = ReviewListQuery {
            sort: Some("BEST".into()),
            ..Default::default()
        };
        let err = ReviewFilter::from_query(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownSortKey);
    }

    #[test]
    fn test_seller_restriction_follows_filters() {
        let q = ReviewListQuery {
            member_login_id: Some("kim".into()),
            ..Default::default()
        };
        let mut filter = ReviewFilter::from_query(&q).unwrap();
        filter.restrict_to_seller(5);
        assert_eq!(
            filter.builder.build_where_clause(),
            " WHERE r.is_deleted = FALSE AND u.login_id ILIKE $1 AND pi.seller_id = $2"
        );
        assert_eq!(filter.builder.page_clause(), " LIMIT $3 OFFSET $4");
    }
}
