//! Admin server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Admin server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP listen port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for seller tokens
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub jwt_expiry_hours: i64,
    /// Connection pool size
    pub db_max_connections: u32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// S3 bucket for product images
    pub image_s3_bucket: String,
    /// Public URL prefix under which uploaded images are served
    pub image_base_url: String,
    /// Emit JSON log lines (env: LOG_FORMAT=json)
    pub log_json: bool,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let image_s3_bucket =
            std::env::var("IMAGE_S3_BUCKET").unwrap_or_else(|_| "market-admin-images".into());
        let image_base_url = std::env::var("IMAGE_BASE_URL")
            .unwrap_or_else(|_| format!("https://{image_s3_bucket}.s3.amazonaws.com"));

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: Self::parsed("HTTP_PORT", 8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_hours: Self::parsed("JWT_EXPIRY_HOURS", 24),
            db_max_connections: Self::parsed("DB_MAX_CONNECTIONS", 10),
            request_timeout_secs: Self::parsed("REQUEST_TIMEOUT_SECS", 30),
            image_s3_bucket,
            image_base_url: image_base_url.trim_end_matches('/').to_string(),
            log_json: std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
            environment,
        })
    }
}
