//! Application state for market-admin

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::rate_limit::RateLimiter;
use crate::config::Config;
use crate::storage::ImageStorage;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Product image bucket
    pub images: ImageStorage,
    /// HS256 secret for seller tokens
    pub jwt_secret: String,
    /// Seller token lifetime
    pub jwt_expiry_hours: i64,
    /// Rate limiter for login/signup routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create a new AppState: connect, run migrations, build the S3 client.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let s3 = S3Client::new(&aws_config);

        Ok(Self {
            pool,
            images: ImageStorage::new(
                s3,
                config.image_s3_bucket.clone(),
                config.image_base_url.clone(),
            ),
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiry_hours: config.jwt_expiry_hours,
            rate_limiter: RateLimiter::new(),
        })
    }
}
