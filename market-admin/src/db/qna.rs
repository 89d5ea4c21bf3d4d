//! Q&A queries

use chrono::NaiveDateTime;
use shared::error::{AppError, ErrorCode};
use shared::models::{QuestionDetail, QuestionListQuery, QuestionSummary};
use shared::pagination::Page;
use shared::util::OPEN_END_SQL;
use sqlx::{PgConnection, PgPool};

use super::query::{QueryBuilder, latest_product_info, live, lookup};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_LIMIT: u32 = 10;

/// Inquiry type filter values mapped to `question_types.id`
const INQUIRY_TYPES: &[(&str, i32)] = &[
    ("PRODUCT", 1),
    ("SHIPPING", 2),
    ("EXCHANGE", 3),
    ("REFUND", 4),
    ("ETC", 5),
];

fn from_clause() -> String {
    format!(
        r#"
        FROM questions AS q
        JOIN question_types AS qt ON qt.id = q.type_id
        JOIN users AS u ON u.id = q.user_id{product}
        JOIN seller_info AS s ON s.seller_id = pi.seller_id AND s.end_date = {OPEN_END_SQL}
        "#,
        product = latest_product_info("q.product_id", "name, seller_id"),
    )
}

fn base_builder() -> QueryBuilder {
    let mut builder = QueryBuilder::new();
    builder.live("q");
    builder
}

pub fn list_filter(q: &QuestionListQuery) -> Result<QueryBuilder, AppError> {
    let mut builder = base_builder();
    if let Some(name) = q.product_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        builder.contains("pi.name", name);
    }
    if let Some(id) = q.question_id {
        builder.eq_i64("q.id", id);
    }
    if let Some(name) = q.seller_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        builder.contains("s.korean_name", name);
    }
    if let Some(id) = q.seller_id {
        builder.eq_i64("pi.seller_id", id);
    }
    if let Some(kind) = q.inquiry_type.as_deref().filter(|k| !k.is_empty()) {
        let type_id = lookup(INQUIRY_TYPES, kind).ok_or_else(|| {
            AppError::new(ErrorCode::UnknownFilterTarget).with_detail("inquiry_type", kind)
        })?;
        builder.eq_i32("q.type_id", type_id);
    }
    builder.date_range("q.created_at", q.registered_from, q.registered_to);
    Ok(builder)
}

pub async fn list_questions(
    pool: &PgPool,
    builder: &QueryBuilder,
    page: Page,
) -> Result<Vec<QuestionSummary>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            q.id AS question_id,
            qt.type_name,
            q.created_at,
            u.phone_number AS user_phone,
            pi.name AS product_name,
            s.korean_name AS seller_name,
            q.content,
            q.user_id,
            EXISTS(
                SELECT 1 FROM answers AS a
                WHERE a.question_id = q.id AND {live_answer}
            ) AS is_answered
        {from}{where_clause}
        ORDER BY q.id DESC{page}
        "#,
        live_answer = live("a"),
        from = from_clause(),
        where_clause = builder.build_where_clause(),
        page = builder.page_clause(),
    );
    let query = builder.apply_bindings(sqlx::query_as::<_, QuestionSummary>(&sql));
    let rows = QueryBuilder::apply_page(query, page).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn count_questions(pool: &PgPool, builder: &QueryBuilder) -> Result<i64, BoxError> {
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

pub async fn count_all(pool: &PgPool) -> Result<i64, BoxError> {
    count_questions(pool, &base_builder()).await
}

pub async fn get_detail(
    pool: &PgPool,
    question_id: i64,
) -> Result<Option<QuestionDetail>, BoxError> {
    let sql = format!(
        r#"
        SELECT
            q.id AS question_id,
            qt.type_name,
            q.product_id,
            pi.name AS product_name,
            u.login_id AS user_login_id,
            q.content,
            q.created_at,
            a.id AS answer_id,
            a.content AS answer_content,
            a.replier_id,
            a.created_at AS answered_at
        {from}
        LEFT JOIN answers AS a ON a.question_id = q.id AND {live_answer}
        WHERE q.id = $1 AND {live_question}
        "#,
        from = from_clause(),
        live_answer = live("a"),
        live_question = live("q"),
    );
    let row = sqlx::query_as::<_, QuestionDetail>(&sql)
        .bind(question_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Seller owning the product a live question is about
pub async fn question_owner(pool: &PgPool, question_id: i64) -> Result<Option<i64>, BoxError> {
    let sql = format!(
        "SELECT pi.seller_id FROM questions AS q{} WHERE q.id = $1 AND {}",
        latest_product_info("q.product_id", "seller_id"),
        live("q"),
    );
    let owner = sqlx::query_scalar::<_, i64>(&sql)
        .bind(question_id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

/// Insert the answer unless the question already has a live one.
/// Returns `None` when an answer exists.
pub async fn insert_answer(
    conn: &mut PgConnection,
    question_id: i64,
    replier_id: i64,
    content: &str,
    now: NaiveDateTime,
) -> Result<Option<i64>, BoxError> {
    // conflict target matches the partial index `uq_answers_live`
    let sql = format!(
        r#"
        INSERT INTO answers (question_id, replier_id, content, created_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (question_id) WHERE {} DO NOTHING
        RETURNING id
        "#,
        live(""),
    );
    let id = sqlx::query_scalar::<_, i64>(&sql)
        .bind(question_id)
        .bind(replier_id)
        .bind(content)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

pub async fn soft_delete(conn: &mut PgConnection, question_id: i64) -> Result<u64, BoxError> {
    let sql = format!(
        "UPDATE questions SET is_deleted = TRUE WHERE id = $1 AND {}",
        live("")
    );
    let result = sqlx::query(&sql)
        .bind(question_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inquiry_type_maps_to_id() {
        let q = QuestionListQuery {
            inquiry_type: Some("REFUND".into()),
            ..Default::default()
        };
        let builder = list_filter(&q).unwrap();
        assert_eq!(
            builder.build_where_clause(),
            " WHERE q.is_deleted = FALSE AND q.type_id = $1"
        );
    }

    #[test]
    fn test_reads_hide_deleted_rows() {
        let from = from_clause();
        assert!(from.contains("WHERE product_id = q.product_id AND is_deleted = FALSE"));
        assert_eq!(base_builder().build_where_clause(), " WHERE q.is_deleted = FALSE");
    }

    #[test]
    fn test_unknown_inquiry_type_rejected() {
        let q = QuestionListQuery {
            inquiry_type: Some("COMPLAINT".into()),
            ..Default::default()
        };
        let err = list_filter(&q).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFilterTarget);
    }
}
