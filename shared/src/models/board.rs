//! Q&A and review models

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ── Q&A ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct QuestionSummary {
    pub question_id: i64,
    pub type_name: String,
    pub created_at: NaiveDateTime,
    pub user_phone: Option<String>,
    pub product_name: String,
    pub seller_name: String,
    pub content: String,
    pub user_id: i64,
    pub is_answered: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct QuestionDetail {
    pub question_id: i64,
    pub type_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub user_login_id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub answer_id: Option<i64>,
    pub answer_content: Option<String>,
    pub replier_id: Option<i64>,
    pub answered_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerCreate {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// GET /api/qna query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionListQuery {
    pub product_name: Option<String>,
    pub question_id: Option<i64>,
    pub seller_name: Option<String>,
    pub seller_id: Option<i64>,
    pub inquiry_type: Option<String>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionSummary>,
    pub total_count: i64,
    pub filtered_count: i64,
}

// ── Review ──

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReviewSummary {
    pub review_id: i64,
    pub seller_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub login_id: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReviewDetail {
    pub review_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub login_id: String,
    pub rating: i32,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

/// GET /api/reviews query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewListQuery {
    pub content: Option<String>,
    pub review_id: Option<i64>,
    pub member_login_id: Option<String>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
    pub updated_from: Option<NaiveDate>,
    pub updated_to: Option<NaiveDate>,
    /// `NEW_REGIST` or `NEW_EDIT`
    pub sort: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewSummary>,
    pub total_count: i64,
    pub filtered_count: i64,
}
