//! market-admin: back-office server for a multi-seller shop
//!
//! - Order lines kept as bitemporal status history (close + insert)
//! - Seller accounts, products, coupons, Q&A and reviews
//! - JWT authenticated admin API, product images on S3

mod api;
mod auth;
mod config;
mod db;
mod error;
mod orders;
mod services;
mod state;
mod storage;
mod util;

use std::net::SocketAddr;
use std::time::Duration;

use config::Config;
use state::AppState;
use tracing_subscriber::EnvFilter;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "market_admin=info,tower_http=info".into());
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Starting market-admin (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    let app = api::create_router(state, Duration::from_secs(config.request_timeout_secs));

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("market-admin HTTP listening on {addr}");

    // ConnectInfo feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
