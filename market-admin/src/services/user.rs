//! Shop members (admin only)

use shared::PaginatedResponse;
use shared::models::{UserListQuery, UserSummary};
use shared::pagination::Page;

use crate::auth::Principal;
use crate::db::user as user_db;
use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn list(
    state: &AppState,
    principal: &Principal,
    query: &UserListQuery,
) -> ServiceResult<PaginatedResponse<UserSummary>> {
    principal.require_admin()?;

    let page = Page::resolve(query.page, query.limit, user_db::DEFAULT_LIMIT);
    let users = user_db::list_users(&state.pool, page).await?;
    let total = user_db::count_users(&state.pool).await?;
    Ok(PaginatedResponse::new(users, total as u64, page))
}
