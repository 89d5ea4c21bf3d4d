//! Seller queries
//!
//! `seller_info` follows the same interval pattern as `order_item_info`:
//! the open row is the current profile.

use chrono::NaiveDateTime;
use shared::models::{
    SellerAccount, SellerCredentials, SellerHistoryEntry, SellerListQuery, SellerLookup,
    SellerProfile, SellerSignup, SellerSummary,
};
use shared::pagination::Page;
use shared::util::{OPEN_END_SQL, open_end};
use sqlx::{PgConnection, PgPool};

use super::query::{QueryBuilder, live};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_LIMIT: u32 = 10;

const PROFILE_COLUMNS: &str = r#"
    id, seller_id, login_id, korean_name, eng_name, service_center_phone,
    site_url, image_url, seller_attribute_id, seller_status_id, manager_id,
    modifier_id, start_date, end_date
"#;

// ── Accounts ──

pub async fn login_id_taken(conn: &mut PgConnection, login_id: &str) -> Result<bool, BoxError> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM seller_info WHERE login_id = $1 AND end_date = $2)",
    )
    .bind(login_id)
    .bind(open_end())
    .fetch_one(&mut *conn)
    .await?;
    Ok(taken)
}

/// Insert `sellers`, `managers` and the first open `seller_info` interval.
/// Returns the new seller id.
pub async fn create(
    conn: &mut PgConnection,
    signup: &SellerSignup,
    password_hash: &str,
    status_id: i32,
    now: NaiveDateTime,
) -> Result<i64, BoxError> {
    let (seller_id,): (i64,) =
        sqlx::query_as("INSERT INTO sellers (is_admin, created_at) VALUES (FALSE, $1) RETURNING id")
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;

    let (manager_id,): (i64,) = sqlx::query_as(
        "INSERT INTO managers (seller_id, phone_number, ordering) VALUES ($1, $2, 1) RETURNING id",
    )
    .bind(seller_id)
    .bind(&signup.manager_phone)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO seller_info (
            seller_id, login_id, password, korean_name, eng_name,
            service_center_phone, site_url, seller_attribute_id, seller_status_id,
            manager_id, modifier_id, start_date, end_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $1, $11, $12)
        "#,
    )
    .bind(seller_id)
    .bind(&signup.login_id)
    .bind(password_hash)
    .bind(&signup.korean_name)
    .bind(&signup.eng_name)
    .bind(&signup.service_center_phone)
    .bind(&signup.site_url)
    .bind(signup.seller_attribute_id)
    .bind(status_id)
    .bind(manager_id)
    .bind(now)
    .bind(open_end())
    .execute(&mut *conn)
    .await?;

    Ok(seller_id)
}

pub async fn find_credentials(
    pool: &PgPool,
    login_id: &str,
) -> Result<Option<SellerCredentials>, BoxError> {
    let sql = format!(
        r#"
        SELECT si.seller_id, si.password
        FROM seller_info AS si
        JOIN sellers AS se ON se.id = si.seller_id
        WHERE si.login_id = $1 AND si.end_date = $2 AND {}
        "#,
        live("se"),
    );
    let row = sqlx::query_as::<_, SellerCredentials>(&sql)
        .bind(login_id)
        .bind(open_end())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_account(pool: &PgPool, seller_id: i64) -> Result<Option<SellerAccount>, BoxError> {
    let row = sqlx::query_as::<_, SellerAccount>(
        r#"
        SELECT se.id, se.is_admin, se.is_deleted, si.manager_id
        FROM sellers AS se
        LEFT JOIN seller_info AS si ON si.seller_id = se.id AND si.end_date = $2
        WHERE se.id = $1
        "#,
    )
    .bind(seller_id)
    .bind(open_end())
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ── Profile intervals ──

pub async fn get_profile(pool: &PgPool, seller_id: i64) -> Result<Option<SellerProfile>, BoxError> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM seller_info WHERE seller_id = $1 AND end_date = $2"
    );
    let row = sqlx::query_as::<_, SellerProfile>(&sql)
        .bind(seller_id)
        .bind(open_end())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Open profile row, locked until the transaction ends
pub async fn lock_open_profile(
    conn: &mut PgConnection,
    seller_id: i64,
) -> Result<Option<SellerProfile>, BoxError> {
    let sql = format!(
        "SELECT {PROFILE_COLUMNS} FROM seller_info \
         WHERE seller_id = $1 AND end_date = $2 FOR UPDATE"
    );
    let row = sqlx::query_as::<_, SellerProfile>(&sql)
        .bind(seller_id)
        .bind(open_end())
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Close a profile interval if it is still open. Returns affected rows.
pub async fn close_profile(
    conn: &mut PgConnection,
    record_id: i64,
    at: NaiveDateTime,
) -> Result<u64, BoxError> {
    let result =
        sqlx::query("UPDATE seller_info SET end_date = $1 WHERE id = $2 AND end_date = $3")
            .bind(at)
            .bind(record_id)
            .bind(open_end())
            .execute(&mut *conn)
            .await?;
    Ok(result.rows_affected())
}

/// Insert the successor of `prior_id`; the password hash is copied from it.
pub async fn insert_profile(
    conn: &mut PgConnection,
    prior_id: i64,
    next: &SellerProfile,
) -> Result<i64, BoxError> {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO seller_info (
            seller_id, login_id, password, korean_name, eng_name,
            service_center_phone, site_url, image_url, seller_attribute_id,
            seller_status_id, manager_id, modifier_id, start_date, end_date
        )
        SELECT
            seller_id, login_id, password, $2, $3, $4, $5, $6, $7, $8,
            manager_id, $9, $10, $11
        FROM seller_info
        WHERE id = $1
        RETURNING id
        "#,
    )
    .bind(prior_id)
    .bind(&next.korean_name)
    .bind(&next.eng_name)
    .bind(&next.service_center_phone)
    .bind(&next.site_url)
    .bind(&next.image_url)
    .bind(next.seller_attribute_id)
    .bind(next.seller_status_id)
    .bind(next.modifier_id)
    .bind(next.start_date)
    .bind(next.end_date)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn list_history(
    pool: &PgPool,
    seller_id: i64,
) -> Result<Vec<SellerHistoryEntry>, BoxError> {
    let rows = sqlx::query_as::<_, SellerHistoryEntry>(
        r#"
        SELECT seller_status_id, korean_name, modifier_id,
               start_date AS valid_from, end_date AS valid_to
        FROM seller_info
        WHERE seller_id = $1
        ORDER BY start_date ASC, id ASC
        "#,
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Lists ──

const LIST_FROM: &str = r#"
    FROM seller_info AS si
    JOIN sellers AS se ON se.id = si.seller_id
    JOIN managers AS m ON m.id = si.manager_id
"#;

fn base_builder() -> QueryBuilder {
    let mut builder = QueryBuilder::new();
    builder
        .add_condition(&format!("si.end_date = {OPEN_END_SQL}"))
        .live("se")
        .add_condition("se.is_admin = FALSE");
    builder
}

/// Predicates for the admin seller list
pub fn list_filter(q: &SellerListQuery) -> QueryBuilder {
    let mut builder = base_builder();
    if let Some(id) = q.seller_id {
        builder.eq_i64("si.seller_id", id);
    }
    let text_filters = [
        ("si.login_id", &q.login_id),
        ("si.eng_name", &q.eng_name),
        ("si.korean_name", &q.korean_name),
        ("m.name", &q.manager_name),
        ("m.phone_number", &q.manager_phone),
        ("m.email", &q.manager_email),
    ];
    for (column, value) in text_filters {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            builder.contains(column, v);
        }
    }
    if let Some(status) = q.seller_status_id {
        builder.eq_i32("si.seller_status_id", status);
    }
    if let Some(attr) = q.seller_attribute_id {
        builder.eq_i32("si.seller_attribute_id", attr);
    }
    builder.date_range("se.created_at", q.registered_from, q.registered_to);
    builder
}

pub async fn list_sellers(
    pool: &PgPool,
    builder: &QueryBuilder,
    page: Page,
) -> Result<Vec<SellerSummary>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            si.seller_id,
            si.login_id,
            si.eng_name,
            si.korean_name,
            m.name AS manager_name,
            si.seller_status_id,
            m.phone_number AS manager_phone,
            m.email AS manager_email,
            si.seller_attribute_id,
            (
                SELECT COUNT(DISTINCT pi.product_id) FROM product_info AS pi
                WHERE pi.seller_id = si.seller_id AND {live_pi}
            ) AS product_count,
            si.site_url,
            se.created_at AS registered_at
        {LIST_FROM}{where_clause}
        ORDER BY se.id DESC{page}
        "#,
        where_clause = builder.build_where_clause(),
        page = builder.page_clause(),
        live_pi = live("pi"),
    );
    let query = builder.apply_bindings(sqlx::query_as::<_, SellerSummary>(&sql));
    let rows = QueryBuilder::apply_page(query, page).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn count_sellers(pool: &PgPool, builder: &QueryBuilder) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) {LIST_FROM}{}", builder.build_where_clause());
    let count = builder
        .apply_bindings_scalar(sqlx::query_scalar::<_, i64>(&sql))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Unfiltered seller count for list metadata
pub async fn count_all(pool: &PgPool) -> Result<i64, BoxError> {
    count_sellers(pool, &base_builder()).await
}

/// Sellers whose korean name starts with `name` (product form lookup)
pub async fn search_by_name(pool: &PgPool, name: &str) -> Result<Vec<SellerLookup>, BoxError> {
    let mut builder = base_builder();
    builder.starts_with("si.korean_name", name);
    let sql = format!(
        r#"
        SELECT si.seller_id, si.korean_name, si.image_url, si.seller_attribute_id
        {LIST_FROM}{where_clause}
        ORDER BY si.korean_name ASC
        LIMIT 10
        "#,
        where_clause = builder.build_where_clause(),
    );
    let rows = builder
        .apply_bindings(sqlx::query_as::<_, SellerLookup>(&sql))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter_skips_blank_text() {
        let q = SellerListQuery {
            login_id: Some("  ".into()),
            korean_name: Some("브랜".into()),
            seller_status_id: Some(2),
            ..Default::default()
        };
        let builder = list_filter(&q);
        let clause = builder.build_where_clause();
        assert!(clause.contains("si.end_date = TIMESTAMP '9999-12-31 23:59:59'"));
        assert!(clause.contains("se.is_deleted = FALSE"));
        assert!(!clause.contains("si.login_id"));
        assert!(clause.contains("si.korean_name ILIKE $1"));
        assert!(clause.contains("si.seller_status_id = $2"));
        assert_eq!(builder.binding_count(), 2);
    }

    #[test]
    fn test_unfiltered_list_has_no_bindings() {
        let builder = list_filter(&SellerListQuery::default());
        assert_eq!(builder.binding_count(), 0);
        assert_eq!(builder.page_clause(), " LIMIT $1 OFFSET $2");
    }
}
