//! Customer questions and reviews
//!
//! Sellers see and act on entries about their own products; admins on all.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    AnswerCreate, QuestionDetail, QuestionListQuery, QuestionListResponse, ReviewDetail,
    ReviewListQuery, ReviewListResponse,
};
use shared::pagination::Page;
use shared::util::now_local;
use validator::Validate;

use crate::auth::Principal;
use crate::db::qna as qna_db;
use crate::db::review::{self as review_db, ReviewFilter};
use crate::error::ServiceResult;
use crate::state::AppState;

// ── Q&A ──

pub async fn list_questions(
    state: &AppState,
    principal: &Principal,
    query: &QuestionListQuery,
) -> ServiceResult<QuestionListResponse> {
    let mut scoped = query.clone();
    if let Some(seller_id) = principal.seller_scope() {
        scoped.seller_id = Some(seller_id);
    }
    let builder = qna_db::list_filter(&scoped)?;
    let page = Page::resolve(query.page, query.limit, qna_db::DEFAULT_LIMIT);

    let questions = qna_db::list_questions(&state.pool, &builder, page).await?;
    let filtered_count = qna_db::count_questions(&state.pool, &builder).await?;
    let total_count = match principal.seller_scope() {
        Some(seller_id) => {
            let own = QuestionListQuery {
                seller_id: Some(seller_id),
                ..Default::default()
            };
            qna_db::count_questions(&state.pool, &qna_db::list_filter(&own)?).await?
        }
        None => qna_db::count_all(&state.pool).await?,
    };

    Ok(QuestionListResponse {
        questions,
        total_count,
        filtered_count,
    })
}

async fn ensure_question_access(
    state: &AppState,
    principal: &Principal,
    question_id: i64,
) -> ServiceResult<()> {
    let owner = qna_db::question_owner(&state.pool, question_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::QuestionNotFound))?;
    principal.require_self_or_admin(owner)?;
    Ok(())
}

pub async fn question_detail(
    state: &AppState,
    principal: &Principal,
    question_id: i64,
) -> ServiceResult<QuestionDetail> {
    ensure_question_access(state, principal, question_id).await?;
    let detail = qna_db::get_detail(&state.pool, question_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::QuestionNotFound))?;
    Ok(detail)
}

pub async fn answer(
    state: &AppState,
    principal: &Principal,
    question_id: i64,
    answer: &AnswerCreate,
) -> ServiceResult<i64> {
    answer.validate()?;
    ensure_question_access(state, principal, question_id).await?;

    let mut tx = state.pool.begin().await?;
    let id = qna_db::insert_answer(
        &mut tx,
        question_id,
        principal.seller_id,
        &answer.content,
        now_local(),
    )
    .await?
    .ok_or_else(|| {
        AppError::new(ErrorCode::AnswerAlreadyExists).with_detail("question_id", question_id)
    })?;
    tx.commit().await?;

    tracing::info!(question_id, answer_id = id, "Question answered");
    Ok(id)
}

pub async fn delete_question(
    state: &AppState,
    principal: &Principal,
    question_id: i64,
) -> ServiceResult<()> {
    ensure_question_access(state, principal, question_id).await?;

    let mut tx = state.pool.begin().await?;
    if qna_db::soft_delete(&mut tx, question_id).await? == 0 {
        return Err(AppError::new(ErrorCode::QuestionNotFound).into());
    }
    tx.commit().await?;
    Ok(())
}

// ── Reviews ──

pub async fn list_reviews(
    state: &AppState,
    principal: &Principal,
    query: &ReviewListQuery,
) -> ServiceResult<ReviewListResponse> {
    let mut filter = ReviewFilter::from_query(query)?;
    if let Some(seller_id) = principal.seller_scope() {
        filter.restrict_to_seller(seller_id);
    }

    let reviews = review_db::list_reviews(&state.pool, &filter).await?;
    let filtered_count = review_db::count_reviews(&state.pool, &filter).await?;
    let total_count = review_db::count_all(&state.pool, principal.seller_scope()).await?;

    Ok(ReviewListResponse {
        reviews,
        total_count,
        filtered_count,
    })
}

async fn ensure_review_access(
    state: &AppState,
    principal: &Principal,
    review_id: i64,
) -> ServiceResult<()> {
    let owner = review_db::review_owner(&state.pool, review_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound))?;
    principal.require_self_or_admin(owner)?;
    Ok(())
}

pub async fn review_detail(
    state: &AppState,
    principal: &Principal,
    review_id: i64,
) -> ServiceResult<ReviewDetail> {
    ensure_review_access(state, principal, review_id).await?;
    let detail = review_db::get_detail(&state.pool, review_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ReviewNotFound))?;
    Ok(detail)
}

pub async fn delete_review(
    state: &AppState,
    principal: &Principal,
    review_id: i64,
) -> ServiceResult<()> {
    ensure_review_access(state, principal, review_id).await?;

    let mut tx = state.pool.begin().await?;
    if review_db::soft_delete(&mut tx, review_id).await? == 0 {
        return Err(AppError::new(ErrorCode::ReviewNotFound).into());
    }
    tx.commit().await?;
    Ok(())
}
