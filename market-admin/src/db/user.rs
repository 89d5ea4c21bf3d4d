//! Member (shop user) queries

use shared::models::UserSummary;
use shared::pagination::Page;
use sqlx::PgPool;

use super::query::live;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const DEFAULT_LIMIT: u32 = 10;

pub async fn list_users(pool: &PgPool, page: Page) -> Result<Vec<UserSummary>, BoxError> {
    let sql = format!(
        r#"
        SELECT id, login_id, phone_number, email, created_at
        FROM users
        WHERE {}
        ORDER BY id DESC
        LIMIT $1 OFFSET $2
        "#,
        live(""),
    );
    let rows = sqlx::query_as::<_, UserSummary>(&sql)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_users(pool: &PgPool) -> Result<i64, BoxError> {
    let sql = format!("SELECT COUNT(*) FROM users WHERE {}", live(""));
    let count: i64 = sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
