//! Seller accounts and profiles

use shared::error::{AppError, ErrorCode};
use shared::models::{
    LoginResponse, SELLER_STATUS_PENDING, SellerHistoryEntry, SellerListQuery, SellerListResponse,
    SellerLogin, SellerLookup, SellerProfile, SellerProfileUpdate, SellerSignup,
};
use shared::pagination::Page;
use shared::util::{now_local, open_end};
use validator::Validate;

use crate::auth::Principal;
use crate::auth::seller_auth::create_token;
use crate::db::seller as seller_db;
use crate::error::{ServiceResult, is_unique_violation};
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

fn login_id_exists(login_id: &str) -> AppError {
    AppError::new(ErrorCode::SellerLoginIdExists).with_detail("login_id", login_id)
}

pub async fn signup(state: &AppState, signup: &SellerSignup) -> ServiceResult<i64> {
    signup.validate()?;

    let password_hash = hash_password(&signup.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::internal("Password hashing failed")
    })?;

    let mut tx = state.pool.begin().await?;
    if seller_db::login_id_taken(&mut tx, &signup.login_id).await? {
        return Err(login_id_exists(&signup.login_id).into());
    }
    let created = seller_db::create(
        &mut tx,
        signup,
        &password_hash,
        SELLER_STATUS_PENDING,
        now_local(),
    )
    .await;
    let seller_id = match created {
        Ok(id) => id,
        // A concurrent signup took the login id after the check above.
        Err(e) if is_unique_violation(&e) => {
            return Err(login_id_exists(&signup.login_id).into());
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;

    tracing::info!(seller_id, login_id = %signup.login_id, "Seller signed up");
    Ok(seller_id)
}

pub async fn login(state: &AppState, login: &SellerLogin) -> ServiceResult<LoginResponse> {
    login.validate()?;

    let credentials = seller_db::find_credentials(&state.pool, &login.login_id)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&login.password, &credentials.password) {
        tracing::info!(login_id = %login.login_id, "Seller login rejected");
        return Err(AppError::invalid_credentials().into());
    }

    let account = seller_db::find_account(&state.pool, credentials.seller_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::AccountNotFound))?;
    if account.is_deleted {
        return Err(AppError::new(ErrorCode::AccountDeleted).into());
    }

    let access_token = create_token(account.id, &state.jwt_secret, state.jwt_expiry_hours)
        .map_err(|e| {
            tracing::error!("JWT creation failed: {e}");
            AppError::internal("Token creation failed")
        })?;

    Ok(LoginResponse {
        access_token,
        seller_id: account.id,
        is_admin: account.is_admin,
    })
}

pub async fn list(
    state: &AppState,
    principal: &Principal,
    query: &SellerListQuery,
) -> ServiceResult<SellerListResponse> {
    principal.require_admin()?;

    let builder = seller_db::list_filter(query);
    let page = Page::resolve(query.page, query.limit, seller_db::DEFAULT_LIMIT);

    let sellers = seller_db::list_sellers(&state.pool, &builder, page).await?;
    let filtered_count = seller_db::count_sellers(&state.pool, &builder).await?;
    let total_count = seller_db::count_all(&state.pool).await?;

    Ok(SellerListResponse {
        sellers,
        total_count,
        filtered_count,
    })
}

pub async fn profile(
    state: &AppState,
    principal: &Principal,
    seller_id: i64,
) -> ServiceResult<SellerProfile> {
    principal.require_self_or_admin(seller_id)?;
    let profile = seller_db::get_profile(&state.pool, seller_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SellerNotFound))?;
    Ok(profile)
}

pub async fn history(
    state: &AppState,
    principal: &Principal,
    seller_id: i64,
) -> ServiceResult<Vec<SellerHistoryEntry>> {
    principal.require_self_or_admin(seller_id)?;
    let rows = seller_db::list_history(&state.pool, seller_id).await?;
    if rows.is_empty() {
        return Err(AppError::new(ErrorCode::SellerNotFound).into());
    }
    Ok(rows)
}

/// Successor profile interval for an edit at `now`.
///
/// Starts no earlier than the interval it replaces, so a clock step backwards
/// cannot produce an inverted interval.
fn next_profile(
    current: &SellerProfile,
    change: &SellerProfileUpdate,
    modifier_id: i64,
    now: chrono::NaiveDateTime,
) -> SellerProfile {
    let mut next = change.apply_to(current);
    next.modifier_id = Some(modifier_id);
    next.start_date = now.max(current.start_date);
    next.end_date = open_end();
    next
}

/// Bitemporal edit: close the open `seller_info` row and insert its successor.
pub async fn update_profile(
    state: &AppState,
    principal: &Principal,
    seller_id: i64,
    change: &SellerProfileUpdate,
) -> ServiceResult<SellerProfile> {
    principal.require_self_or_admin(seller_id)?;
    change.validate()?;
    if change.is_empty() {
        return Err(AppError::invalid_request("Nothing to update").into());
    }
    // status moves are an admin decision
    if change.seller_status_id.is_some() {
        principal.require_admin()?;
    }

    let mut tx = state.pool.begin().await?;
    let current = seller_db::lock_open_profile(&mut tx, seller_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::SellerNotFound))?;

    let next = next_profile(&current, change, principal.seller_id, now_local());
    if seller_db::close_profile(&mut tx, current.id, next.start_date).await? == 0 {
        return Err(AppError::new(ErrorCode::SellerProfileConflict)
            .with_detail("seller_id", seller_id)
            .into());
    }
    let id = seller_db::insert_profile(&mut tx, current.id, &next).await?;
    tx.commit().await?;

    tracing::info!(seller_id, modifier_id = principal.seller_id, "Seller profile updated");
    Ok(SellerProfile { id, ..next })
}

pub async fn search_by_name(state: &AppState, name: &str) -> ServiceResult<Vec<SellerLookup>> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(Vec::new());
    }
    Ok(seller_db::search_by_name(&state.pool, name).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared::util::is_open;

    fn at(h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn current() -> SellerProfile {
        SellerProfile {
            id: 10,
            seller_id: 3,
            login_id: "brandi01".into(),
            korean_name: "브랜디".into(),
            eng_name: "brandi".into(),
            service_center_phone: "0212345678".into(),
            site_url: "https://brandi.example".into(),
            image_url: None,
            seller_attribute_id: 2,
            seller_status_id: 1,
            manager_id: 4,
            modifier_id: Some(3),
            start_date: at(9),
            end_date: open_end(),
        }
    }

    #[test]
    fn test_next_profile_opens_at_now() {
        let change = SellerProfileUpdate {
            seller_status_id: Some(2),
            ..Default::default()
        };
        let next = next_profile(&current(), &change, 1, at(12));
        assert_eq!(next.start_date, at(12));
        assert!(is_open(next.end_date));
        assert_eq!(next.modifier_id, Some(1));
        assert_eq!(next.seller_status_id, 2);
        assert_eq!(next.korean_name, "브랜디");
    }

    #[test]
    fn test_next_profile_never_starts_before_prior() {
        let next = next_profile(&current(), &SellerProfileUpdate::default(), 1, at(8));
        assert_eq!(next.start_date, at(9));
    }

    #[test]
    fn test_duplicate_login_id_is_a_conflict() {
        let err = login_id_exists("brandi01");
        assert_eq!(err.code, ErrorCode::SellerLoginIdExists);
        assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
        assert_eq!(err.details.unwrap()["login_id"], "brandi01");
    }
}
