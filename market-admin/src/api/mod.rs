//! HTTP routes for the admin server
//!
//! Public: health, seller signup/login (rate limited).
//! Everything under `/api` else requires a seller token.

mod board;
mod coupon;
mod health;
mod image;
mod order;
mod product;
mod seller;
mod user;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::{Json, Router, middleware};
use shared::error::AppError;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::{login_rate_limit, signup_rate_limit};
use crate::auth::seller_auth::seller_auth_middleware;
use crate::state::AppState;
use crate::storage::images::MAX_FILE_SIZE;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// Multipart framing on top of the raw file
const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

/// Create the combined router
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let login = Router::new()
        .route("/api/sellers/login", post(seller::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let signup = Router::new()
        .route("/api/sellers/signup", post(seller::signup))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            signup_rate_limit,
        ));

    let uploads = Router::new()
        .route("/api/images", post(image::upload_image))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let authed = Router::new()
        // Sellers
        .route("/api/sellers", get(seller::list_sellers))
        .route("/api/sellers/search", get(seller::search_sellers))
        .route(
            "/api/sellers/{id}",
            get(seller::get_profile).put(seller::update_profile),
        )
        .route("/api/sellers/{id}/history", get(seller::profile_history))
        // Orders
        .route("/api/orders", get(order::list_orders))
        .route(
            "/api/orders/{line_id}",
            get(order::get_order).patch(order::update_order),
        )
        .route("/api/orders/status", post(order::change_status))
        .route("/api/orders/cancel", post(order::cancel))
        .route("/api/orders/refund-request", post(order::request_refund))
        .route("/api/orders/refund-complete", post(order::complete_refund))
        .route("/api/orders/refund-withdraw", post(order::withdraw_refund))
        // Products
        .route(
            "/api/products",
            get(product::list_products).post(product::create_product),
        )
        .route(
            "/api/products/{id}",
            get(product::get_product).delete(product::delete_product),
        )
        .route("/api/categories/first", get(product::first_categories))
        .route(
            "/api/categories/{first_id}/second",
            get(product::second_categories),
        )
        // Images
        .merge(uploads)
        .route("/api/images/{hash}", delete(image::delete_image))
        // Coupons
        .route(
            "/api/coupons",
            get(coupon::list_coupons).post(coupon::create_coupon),
        )
        .route(
            "/api/coupons/{id}",
            get(coupon::get_coupon)
                .put(coupon::update_coupon)
                .delete(coupon::delete_coupon),
        )
        // Q&A
        .route("/api/questions", get(board::list_questions))
        .route(
            "/api/questions/{id}",
            get(board::get_question).delete(board::delete_question),
        )
        .route("/api/questions/{id}/answer", post(board::answer_question))
        // Reviews
        .route("/api/reviews", get(board::list_reviews))
        .route(
            "/api/reviews/{id}",
            get(board::get_review).delete(board::delete_review),
        )
        // Members
        .route("/api/users", get(user::list_users))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            seller_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(login)
        .merge(signup)
        .merge(authed)
        .layer(TimeoutLayer::with_status_code(
            http::StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
