//! Seller JWT authentication
//!
//! The middleware resolves the bearer token to a [`Principal`] and inserts it
//! into request extensions; handlers take it with `Extension<Principal>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::db;
use crate::state::AppState;

/// JWT claims for seller authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct SellerClaims {
    /// Seller ID
    pub sub: i64,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated seller resolved from a bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub seller_id: i64,
    pub is_admin: bool,
    pub manager_id: Option<i64>,
}

impl Principal {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::admin_required())
        }
    }

    /// Admins may act on any seller; a seller only on itself.
    pub fn require_self_or_admin(&self, seller_id: i64) -> Result<(), AppError> {
        if self.is_admin || self.seller_id == seller_id {
            Ok(())
        } else {
            Err(AppError::permission_denied("Not your seller account"))
        }
    }

    /// `None` for admins, the own seller id otherwise
    pub fn seller_scope(&self) -> Option<i64> {
        (!self.is_admin).then_some(self.seller_id)
    }
}

pub fn create_token(
    seller_id: i64,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = SellerClaims {
        sub: seller_id,
        exp: (now + chrono::Duration::hours(expiry_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify signature and expiry; returns the seller id.
pub fn verify_token(token: &str, secret: &str) -> Result<i64, AppError> {
    let data = jsonwebtoken::decode::<SellerClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;
    Ok(data.claims.sub)
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(AppError::not_authenticated)?
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format"))
}

/// Seller id carried by the request's bearer token.
fn authenticated_seller(request: &Request, secret: &str) -> Result<i64, AppError> {
    verify_token(bearer_token(request)?, secret)
}

/// Resolve the principal; a rejection ends the request before any handler runs.
pub async fn seller_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    // The request borrow must end here; `Body` is not `Sync`.
    let seller_id = match authenticated_seller(&request, &state.jwt_secret) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    let principal = match resolve(&state, seller_id).await {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    request.extensions_mut().insert(principal);
    next.run(request).await
}

async fn resolve(state: &AppState, seller_id: i64) -> Result<Principal, AppError> {
    let account = db::seller::find_account(&state.pool, seller_id)
        .await
        .map_err(|e| {
            tracing::error!(seller_id, "Account lookup failed: {e}");
            AppError::new(ErrorCode::DatabaseError)
        })?
        .ok_or_else(|| AppError::new(ErrorCode::AccountNotFound))?;

    if account.is_deleted {
        return Err(AppError::new(ErrorCode::AccountDeleted));
    }

    Ok(Principal {
        seller_id: account.id,
        is_admin: account.is_admin,
        manager_id: account.manager_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_token(42, SECRET, 1).unwrap();
        assert_eq!(verify_token(&token, SECRET).unwrap(), 42);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(42, SECRET, 1).unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_expired_token() {
        // well past the default 60s leeway
        let token = create_token(42, SECRET, -2).unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_missing_and_malformed_header() {
        let request = http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(
            bearer_token(&request).unwrap_err().code,
            ErrorCode::NotAuthenticated
        );

        let request = http::Request::builder()
            .header("Authorization", "Basic abc")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(
            bearer_token(&request).unwrap_err().code,
            ErrorCode::TokenInvalid
        );
    }

    #[test]
    fn test_authenticated_seller_from_header() {
        let token = create_token(7, SECRET, 1).unwrap();
        let request = http::Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(authenticated_seller(&request, SECRET).unwrap(), 7);
        assert_eq!(
            authenticated_seller(&request, "other").unwrap_err().code,
            ErrorCode::TokenInvalid
        );
    }

    fn require_send<F: std::future::Future + Send>(_: F) {}

    #[test]
    fn test_middleware_future_is_send() {
        // Checked at compile time; `from_fn_with_state` needs a Send future.
        let _ = |state: AppState, request: Request, next: Next| {
            require_send(seller_auth_middleware(State(state), request, next))
        };
    }

    #[test]
    fn test_scopes() {
        let seller = Principal {
            seller_id: 3,
            is_admin: false,
            manager_id: Some(9),
        };
        assert!(seller.require_admin().is_err());
        assert!(seller.require_self_or_admin(3).is_ok());
        assert!(seller.require_self_or_admin(4).is_err());
        assert_eq!(seller.seller_scope(), Some(3));

        let admin = Principal {
            seller_id: 1,
            is_admin: true,
            manager_id: None,
        };
        assert!(admin.require_self_or_admin(4).is_ok());
        assert_eq!(admin.seller_scope(), None);
    }
}
