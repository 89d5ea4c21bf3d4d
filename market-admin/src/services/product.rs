//! Product registration and browsing

use shared::PaginatedResponse;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    FirstCategory, ProductCreate, ProductCreated, ProductDetail, ProductListQuery, ProductSummary,
    SecondCategory,
};
use shared::util::now_local;
use validator::Validate;

use crate::auth::Principal;
use crate::db::product::{self as product_db, ProductFilter};
use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn list(
    state: &AppState,
    principal: &Principal,
    query: &ProductListQuery,
) -> ServiceResult<PaginatedResponse<ProductSummary>> {
    let mut filter = ProductFilter::from_query(query)?;
    if let Some(seller_id) = principal.seller_scope() {
        filter.restrict_to_seller(seller_id);
    }

    let products = product_db::list_products(&state.pool, &filter).await?;
    let total = product_db::count_products(&state.pool, &filter).await?;
    Ok(PaginatedResponse::new(products, total as u64, filter.page()))
}

pub async fn detail(
    state: &AppState,
    principal: &Principal,
    product_id: i64,
) -> ServiceResult<ProductDetail> {
    let detail = product_db::get_detail(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    principal.require_self_or_admin(detail.seller_id)?;
    Ok(detail)
}

pub async fn first_categories(
    state: &AppState,
    seller_attribute_id: i32,
) -> ServiceResult<Vec<FirstCategory>> {
    Ok(product_db::first_categories(&state.pool, seller_attribute_id).await?)
}

pub async fn second_categories(
    state: &AppState,
    first_category_id: i64,
) -> ServiceResult<Vec<SecondCategory>> {
    Ok(product_db::second_categories(&state.pool, first_category_id).await?)
}

/// Sellers register for themselves; admins must name the seller.
fn owning_seller(principal: &Principal, requested: Option<i64>) -> Result<i64, AppError> {
    match (principal.is_admin, requested) {
        (true, Some(seller_id)) => Ok(seller_id),
        (true, None) => Err(AppError::with_message(
            ErrorCode::RequiredField,
            "seller_id is required",
        )),
        (false, Some(seller_id)) if seller_id != principal.seller_id => Err(
            AppError::permission_denied("Cannot register products for another seller"),
        ),
        (false, _) => Ok(principal.seller_id),
    }
}

fn check_ranges(product: &ProductCreate) -> Result<(), AppError> {
    if product.min_unit > product.max_unit {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "min_unit must not exceed max_unit",
        ));
    }
    if let (Some(start), Some(end)) = (product.discount_start_date, product.discount_end_date)
        && start > end
    {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "discount_start_date must not be after discount_end_date",
        ));
    }
    if product.is_stock_managed && product.stock_number.is_none() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "stock_number is required when stock is managed",
        ));
    }
    Ok(())
}

pub async fn create(
    state: &AppState,
    principal: &Principal,
    product: &ProductCreate,
) -> ServiceResult<ProductCreated> {
    product.validate()?;
    check_ranges(product)?;
    let seller_id = owning_seller(principal, product.seller_id)?;

    if !product_db::category_pair_exists(
        &state.pool,
        product.first_category_id,
        product.second_category_id,
    )
    .await?
    {
        return Err(AppError::new(ErrorCode::CategoryNotFound).into());
    }

    let mut tx = state.pool.begin().await?;
    let created =
        product_db::create(&mut tx, seller_id, principal.seller_id, product, now_local()).await?;
    tx.commit().await?;

    tracing::info!(
        product_id = created.product_id,
        seller_id,
        product_code = %created.product_code,
        "Product registered"
    );
    Ok(created)
}

pub async fn delete(state: &AppState, principal: &Principal, product_id: i64) -> ServiceResult<()> {
    let owner = product_db::product_owner(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound))?;
    principal.require_self_or_admin(owner)?;

    let mut tx = state.pool.begin().await?;
    if product_db::soft_delete(&mut tx, product_id).await? == 0 {
        return Err(AppError::new(ErrorCode::ProductNotFound).into());
    }
    tx.commit().await?;

    tracing::info!(product_id, "Product deleted");
    Ok(())
}

/// Sellers may drop an image unless another seller's live product shows it.
fn check_image_delete(principal: &Principal, users: &[i64]) -> Result<(), AppError> {
    if principal.is_admin || users.iter().all(|&seller_id| seller_id == principal.seller_id) {
        Ok(())
    } else {
        Err(AppError::permission_denied(
            "Image is used by another seller's product",
        ))
    }
}

pub async fn delete_image(state: &AppState, principal: &Principal, hash: &str) -> ServiceResult<()> {
    if !principal.is_admin {
        let url = state.images.public_url(hash);
        let users = product_db::image_users(&state.pool, &url).await?;
        check_image_delete(principal, &users)?;
    }
    state.images.delete(hash).await?;

    tracing::info!(seller_id = principal.seller_id, hash, "Image deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seller(id: i64) -> Principal {
        Principal {
            seller_id: id,
            is_admin: false,
            manager_id: None,
        }
    }

    #[test]
    fn test_owning_seller() {
        assert_eq!(owning_seller(&seller(3), None).unwrap(), 3);
        assert_eq!(owning_seller(&seller(3), Some(3)).unwrap(), 3);
        assert_eq!(
            owning_seller(&seller(3), Some(4)).unwrap_err().code,
            ErrorCode::PermissionDenied
        );

        let admin = Principal {
            is_admin: true,
            ..seller(1)
        };
        assert_eq!(owning_seller(&admin, Some(4)).unwrap(), 4);
        assert_eq!(
            owning_seller(&admin, None).unwrap_err().code,
            ErrorCode::RequiredField
        );
    }

    #[test]
    fn test_image_delete_scope() {
        // unreferenced or only on own products
        assert!(check_image_delete(&seller(3), &[]).is_ok());
        assert!(check_image_delete(&seller(3), &[3]).is_ok());
        assert_eq!(
            check_image_delete(&seller(3), &[3, 4]).unwrap_err().code,
            ErrorCode::PermissionDenied
        );

        let admin = Principal {
            is_admin: true,
            ..seller(1)
        };
        assert!(check_image_delete(&admin, &[3, 4]).is_ok());
    }

    #[test]
    fn test_unit_range() {
        let product: ProductCreate = serde_json::from_value(serde_json::json!({
            "is_on_sale": true,
            "is_displayed": true,
            "name": "linen shirt",
            "simple_description": null,
            "detail_description": "<p>linen</p>",
            "price": 39000,
            "discount_rate": null,
            "discount_price": null,
            "discount_start_date": null,
            "discount_end_date": null,
            "min_unit": 5,
            "max_unit": 2,
            "is_stock_managed": false,
            "stock_number": null,
            "first_category_id": 1,
            "second_category_id": 3,
            "images": ["https://img.example/a.jpg"],
            "seller_id": null
        }))
        .unwrap();
        assert!(product.validate().is_ok());
        assert_eq!(
            check_ranges(&product).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }
}
