//! Product queries
//!
//! `product_info` keeps every edit as a new row; the current snapshot of a
//! product is its latest row by `created_at`.

use chrono::NaiveDateTime;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    FirstCategory, ProductCreate, ProductCreated, ProductDetail, ProductImage, ProductListQuery,
    ProductSummary, SecondCategory,
};
use shared::pagination::Page;
use shared::util::OPEN_END_SQL;
use sqlx::{PgConnection, PgPool};

use super::query::{QueryBuilder, latest_product_info, live};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_LIMIT: u32 = 10;

fn from_clause() -> String {
    format!(
        r#"
        FROM products AS p{product}
        JOIN seller_info AS s ON s.seller_id = pi.seller_id AND s.end_date = {OPEN_END_SQL}
        JOIN seller_attributes AS sa ON sa.id = s.seller_attribute_id
        "#,
        product = latest_product_info("p.id", "*"),
    )
}

/// Validated product list filter
#[derive(Debug)]
pub struct ProductFilter {
    builder: QueryBuilder,
    page: Page,
}

impl ProductFilter {
    pub fn from_query(q: &ProductListQuery) -> Result<Self, AppError> {
        let mut builder = QueryBuilder::new();
        builder
            .live("p")
            .date_range("pi.created_at", q.created_from, q.created_to);

        let flags = [
            ("pi.is_displayed", q.is_displayed),
            ("pi.is_promotion", q.is_promotion),
            ("pi.is_on_sale", q.is_on_sale),
        ];
        for (column, flag) in flags {
            match flag {
                None => {}
                Some(0) => {
                    builder.eq_bool(column, false);
                }
                Some(1) => {
                    builder.eq_bool(column, true);
                }
                Some(other) => {
                    return Err(AppError::new(ErrorCode::InvalidFormat)
                        .with_detail(column.trim_start_matches("pi."), other));
                }
            }
        }

        if let Some(attr) = q.seller_attribute_id {
            builder.eq_i32("sa.id", attr);
        }

        if let Some(target) = q.search_target.as_deref().filter(|t| !t.is_empty()) {
            let keyword = q.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty());
            match (target, keyword) {
                ("PRODUCT_NAME" | "PRODUCT_NO" | "PRODUCT_CODE", None) => {}
                ("PRODUCT_NAME", Some(k)) => {
                    builder.contains("pi.name", k);
                }
                ("PRODUCT_NO", Some(k)) => {
                    let id: i64 = k.parse().map_err(|_| {
                        AppError::new(ErrorCode::InvalidFormat).with_detail("keyword", k)
                    })?;
                    builder.eq_i64("p.id", id);
                }
                ("PRODUCT_CODE", Some(k)) => {
                    builder.eq_text("pi.product_code", k);
                }
                (other, _) => {
                    return Err(AppError::new(ErrorCode::UnknownFilterTarget)
                        .with_detail("search_target", other));
                }
            }
        }

        if let Some(name) = q.seller_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            builder.contains("s.korean_name", name);
        }

        Ok(Self {
            builder,
            page: Page::resolve(q.page, q.limit, DEFAULT_LIMIT),
        })
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn restrict_to_seller(&mut self, seller_id: i64) {
        self.builder.eq_i64("pi.seller_id", seller_id);
    }
}

pub async fn list_products(
    pool: &PgPool,
    filter: &ProductFilter,
) -> Result<Vec<ProductSummary>, BoxError> {
    let builder = &filter.builder;
    let sql = format!(
        r#"
        SELECT
            p.id,
            pi.main_img,
            pi.name,
            pi.price,
            pi.sales_amount,
            pi.discount_rate,
            pi.discount_price,
            pi.created_at,
            pi.seller_id,
            pi.product_code,
            pi.is_on_sale,
            pi.is_displayed,
            pi.is_promotion,
            s.korean_name AS seller_name,
            sa.attribution_name
        {from}{where_clause}
        ORDER BY p.id DESC{page}
        "#,
        from = from_clause(),
        where_clause = builder.build_where_clause(),
        page = builder.page_clause(),
    );
    let query = builder.apply_bindings(sqlx::query_as::<_, ProductSummary>(&sql));
    let rows = QueryBuilder::apply_page(query, filter.page)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_products(pool: &PgPool, filter: &ProductFilter) -> Result<i64, BoxError> {
    let builder = &filter.builder;
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

/// Current snapshot of a live product with its images in display order
pub async fn get_detail(pool: &PgPool, product_id: i64) -> Result<Option<ProductDetail>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            p.id AS product_id,
            pi.id AS product_info_id,
            pi.product_code,
            pi.price,
            pi.is_on_sale,
            pi.is_displayed,
            pi.name,
            pi.simple_description,
            pi.detail_description,
            pi.discount_rate,
            pi.discount_price,
            pi.is_definite,
            pi.min_unit,
            pi.max_unit,
            pi.seller_id,
            fc.first_category_name,
            sc.second_category_name
        {from}
        JOIN first_categories AS fc ON fc.id = pi.first_category_id
        JOIN second_categories AS sc ON sc.id = pi.second_category_id
        WHERE p.id = $1 AND {live_product}
        "#,
        from = from_clause(),
        live_product = live("p"),
    );
    let detail = sqlx::query_as::<_, ProductDetail>(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    let Some(mut detail) = detail else {
        return Ok(None);
    };
    detail.images = sqlx::query_as::<_, ProductImage>(
        r#"
        SELECT id, url AS image_url, ordering
        FROM product_images
        WHERE product_info_id = $1
        ORDER BY ordering ASC
        "#,
    )
    .bind(detail.product_info_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(detail))
}

/// Seller that owns a live product
pub async fn product_owner(pool: &PgPool, product_id: i64) -> Result<Option<i64>, BoxError> {
    let sql = format!(
        "SELECT pi.seller_id FROM products AS p{} WHERE p.id = $1 AND {}",
        latest_product_info("p.id", "seller_id"),
        live("p"),
    );
    let owner = sqlx::query_scalar::<_, i64>(&sql)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

/// Sellers whose live products show `url` in their current snapshot
pub async fn image_users(pool: &PgPool, url: &str) -> Result<Vec<i64>, BoxError> {
    let sql = format!(
        r#"
        SELECT DISTINCT pi.seller_id
        FROM products AS p{product}
        JOIN product_images AS img ON img.product_info_id = pi.id
        WHERE img.url = $1 AND {live_product}
        "#,
        product = latest_product_info("p.id", "id, seller_id"),
        live_product = live("p"),
    );
    let sellers = sqlx::query_scalar::<_, i64>(&sql)
        .bind(url)
        .fetch_all(pool)
        .await?;
    Ok(sellers)
}

/// `P` + creation date + zero-padded product id, e.g. `P20240301000042`
pub fn product_code(created_at: NaiveDateTime, product_id: i64) -> String {
    format!("P{}{:06}", created_at.format("%Y%m%d"), product_id)
}

/// Insert `products`, the first `product_info` snapshot and its images.
pub async fn create(
    conn: &mut PgConnection,
    seller_id: i64,
    modifier_id: i64,
    product: &ProductCreate,
    now: NaiveDateTime,
) -> Result<ProductCreated, BoxError> {
    let (product_id,): (i64,) =
        sqlx::query_as("INSERT INTO products (created_at) VALUES ($1) RETURNING id")
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;

    let code = product_code(now, product_id);
    let is_promotion = product.discount_rate.is_some() || product.discount_price.is_some();

    let (product_info_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO product_info (
            product_id, product_code, seller_id, is_on_sale, is_displayed,
            is_promotion, name, simple_description, detail_description, price,
            discount_rate, discount_price, discount_start_date, discount_end_date,
            min_unit, max_unit, is_stock_managed, stock_number,
            first_category_id, second_category_id, main_img, modifier_id, created_at
        )
        VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, $19, $20, $21, $22, $23
        )
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(&code)
    .bind(seller_id)
    .bind(product.is_on_sale)
    .bind(product.is_displayed)
    .bind(is_promotion)
    .bind(&product.name)
    .bind(&product.simple_description)
    .bind(&product.detail_description)
    .bind(product.price)
    .bind(product.discount_rate)
    .bind(product.discount_price)
    .bind(product.discount_start_date)
    .bind(product.discount_end_date)
    .bind(product.min_unit)
    .bind(product.max_unit)
    .bind(product.is_stock_managed)
    .bind(product.stock_number)
    .bind(product.first_category_id)
    .bind(product.second_category_id)
    .bind(product.images.first().cloned())
    .bind(modifier_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    for (ordering, url) in (1i32..).zip(&product.images) {
        sqlx::query(
            r#"
            INSERT INTO product_images (url, product_info_id, ordering, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(url)
        .bind(product_info_id)
        .bind(ordering)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(ProductCreated {
        product_id,
        product_info_id,
        product_code: code,
    })
}

/// Soft delete. Returns affected rows.
pub async fn soft_delete(conn: &mut PgConnection, product_id: i64) -> Result<u64, BoxError> {
    let sql = format!(
        "UPDATE products SET is_deleted = TRUE WHERE id = $1 AND {}",
        live("")
    );
    let result = sqlx::query(&sql)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

// ── Categories ──

/// First categories available to a seller attribute (through its attribute group)
pub async fn first_categories(
    pool: &PgPool,
    seller_attribute_id: i32,
) -> Result<Vec<FirstCategory>, BoxError> {
    let rows = sqlx::query_as::<_, FirstCategory>(
        r#"
        SELECT fc.id, fc.first_category_name
        FROM seller_attributes AS sa
        JOIN attribute_group_categories AS agc ON agc.attribute_group_id = sa.attribute_group_id
        JOIN first_categories AS fc ON fc.main_category_id = agc.main_category_id
        WHERE sa.id = $1
        ORDER BY fc.id ASC
        "#,
    )
    .bind(seller_attribute_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn second_categories(
    pool: &PgPool,
    first_category_id: i64,
) -> Result<Vec<SecondCategory>, BoxError> {
    let rows = sqlx::query_as::<_, SecondCategory>(
        r#"
        SELECT id, second_category_name
        FROM second_categories
        WHERE first_category_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(first_category_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Whether `second_category_id` belongs to `first_category_id`
pub async fn category_pair_exists(
    pool: &PgPool,
    first_category_id: i64,
    second_category_id: i64,
) -> Result<bool, BoxError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM second_categories WHERE id = $1 AND first_category_id = $2)",
    )
    .bind(second_category_id)
    .bind(first_category_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_product_code_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(product_code(at, 42), "P20240301000042");
    }

    #[test]
    fn test_current_snapshot_is_latest_live_row() {
        let filter = ProductFilter::from_query(&ProductListQuery::default()).unwrap();
        assert_eq!(filter.builder.build_where_clause(), " WHERE p.is_deleted = FALSE");
        assert!(from_clause().contains("WHERE product_id = p.id AND is_deleted = FALSE"));
    }

    #[test]
    fn test_flags_must_be_zero_or_one() {
        let q = ProductListQuery {
            is_displayed: Some(2),
            ..Default::default()
        };
        let err = ProductFilter::from_query(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn test_filters_build_in_order() {
        let q = ProductListQuery {
            is_on_sale: Some(0),
            search_target: Some("PRODUCT_NO".into()),
            keyword: Some("17".into()),
            seller_name: Some("브랜디".into()),
            ..Default::default()
        };
        let filter = ProductFilter::from_query(&q).unwrap();
        let clause = filter.builder.build_where_clause();
        assert!(clause.contains("pi.is_on_sale = $1"));
        assert!(clause.contains("p.id = $2"));
        assert!(clause.contains("s.korean_name ILIKE $3"));
        assert_eq!(filter.builder.page_clause(), " LIMIT $4 OFFSET $5");
    }

    #[test]
    fn test_unknown_target_rejected() {
        let q = ProductListQuery {
            search_target: Some("SKU".into()),
            keyword: Some("x".into()),
            ..Default::default()
        };
        let err = ProductFilter::from_query(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFilterTarget);
    }

    #[test]
    fn test_product_number_must_be_numeric() {
        let q = ProductListQuery {
            search_target: Some("PRODUCT_NO".into()),
            keyword: Some("abc".into()),
            ..Default::default()
        };
        assert!(ProductFilter::from_query(&q).is_err());
    }
}
