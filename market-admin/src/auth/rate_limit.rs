//! Per-IP fixed-window rate limiting for login and signup routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::state::AppState;

/// Entries whose window started longer ago than this are dropped on the next check
const ENTRY_TTL: Duration = Duration::from_secs(300);

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route name -> (IP -> entry)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request; `true` while the IP is within `max_requests` per window.
    async fn check(&self, route: &'static str, ip: &str, max_requests: u32, window: Duration) -> bool {
        self.check_with_ttl(route, ip, max_requests, window, ENTRY_TTL)
            .await
    }

    async fn check_with_ttl(
        &self,
        route: &'static str,
        ip: &str,
        max_requests: u32,
        window: Duration,
        ttl: Duration,
    ) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route).or_default();
        let now = Instant::now();

        // Stale IPs go under the same lock; no background sweeper.
        route_map.retain(|_, entry| now.duration_since(entry.window_start) < ttl);

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    #[cfg(test)]
    async fn tracked(&self, route: &'static str) -> usize {
        self.inner.lock().await.get(route).map_or(0, HashMap::len)
    }
}

/// Client IP: first `X-Forwarded-For` entry, then the peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn limit(
    state: &AppState,
    route: &'static str,
    max_requests: u32,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_ip(&request);
    if !state
        .rate_limiter
        .check(route, &ip, max_requests, Duration::from_secs(60))
        .await
    {
        tracing::warn!(route, ip = %ip, "Rate limit exceeded");
        return AppError::new(ErrorCode::TooManyAttempts).into_response();
    }
    next.run(request).await
}

/// Seller login: 5 requests/minute per IP
pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    limit(&state, "login", 5, request, next).await
}

/// Seller signup: 3 requests/minute per IP
pub async fn signup_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    limit(&state, "signup", 3, request, next).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_ip() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);
        for _ in 0..5 {
            assert!(limiter.check("login", "10.0.0.1", 5, window).await);
        }
        assert!(!limiter.check("login", "10.0.0.1", 5, window).await);
        // other IPs and routes are counted separately
        assert!(limiter.check("login", "10.0.0.2", 5, window).await);
        assert!(limiter.check("signup", "10.0.0.1", 3, window).await);
    }

    #[tokio::test]
    async fn test_expired_window_resets() {
        let limiter = RateLimiter::new();
        // a zero-length window has always expired
        for _ in 0..3 {
            assert!(limiter.check("login", "10.0.0.1", 1, Duration::ZERO).await);
        }
    }

    #[tokio::test]
    async fn test_check_prunes_stale_entries() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);
        limiter.check("login", "10.0.0.1", 5, window).await;
        limiter.check("login", "10.0.0.2", 5, window).await;
        assert_eq!(limiter.tracked("login").await, 2);

        // every earlier entry is past a zero ttl; only the caller remains
        limiter
            .check_with_ttl("login", "10.0.0.3", 5, window, Duration::ZERO)
            .await;
        assert_eq!(limiter.tracked("login").await, 1);
        // other routes are pruned on their own checks
        limiter.check("signup", "10.0.0.1", 3, window).await;
        assert_eq!(limiter.tracked("signup").await, 1);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_header() {
        let request = http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "203.0.113.7");

        let request = http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }
}
