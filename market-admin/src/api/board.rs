//! Q&A and review board API

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use shared::error::ApiResponse;
use shared::models::{
    AnswerCreate, QuestionDetail, QuestionListQuery, QuestionListResponse, ReviewDetail,
    ReviewListQuery, ReviewListResponse,
};

use super::ApiResult;
use crate::auth::Principal;
use crate::services::board as board_service;
use crate::state::AppState;

/// GET /api/questions
pub async fn list_questions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<QuestionListQuery>,
) -> ApiResult<QuestionListResponse> {
    Ok(Json(
        board_service::list_questions(&state, &principal, &query).await?,
    ))
}

/// GET /api/questions/{id}
pub async fn get_question(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<QuestionDetail> {
    Ok(Json(
        board_service::question_detail(&state, &principal, id).await?,
    ))
}

/// POST /api/questions/{id}/answer
pub async fn answer_question(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(req): Json<AnswerCreate>,
) -> ApiResult<ApiResponse<i64>> {
    let answer_id = board_service::answer(&state, &principal, id, &req).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Answer registered",
        answer_id,
    )))
}

/// DELETE /api/questions/{id}
pub async fn delete_question(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    board_service::delete_question(&state, &principal, id).await?;
    Ok(Json(ApiResponse::ok()))
}

/// GET /api/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReviewListQuery>,
) -> ApiResult<ReviewListResponse> {
    Ok(Json(
        board_service::list_reviews(&state, &principal, &query).await?,
    ))
}

/// GET /api/reviews/{id}
pub async fn get_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<ReviewDetail> {
    Ok(Json(
        board_service::review_detail(&state, &principal, id).await?,
    ))
}

/// DELETE /api/reviews/{id}
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<()>> {
    board_service::delete_review(&state, &principal, id).await?;
    Ok(Json(ApiResponse::ok()))
}
