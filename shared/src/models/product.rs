//! Product Model
//!
//! `product_info` keeps every snapshot; the latest row by `created_at` is the
//! current one.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FirstCategory {
    pub id: i64,
    pub first_category_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SecondCategory {
    pub id: i64,
    pub second_category_name: String,
}

/// Row of the product list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductSummary {
    pub id: i64,
    pub main_img: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub sales_amount: i64,
    pub discount_rate: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub created_at: NaiveDateTime,
    pub seller_id: i64,
    pub product_code: String,
    pub is_on_sale: bool,
    pub is_displayed: bool,
    pub is_promotion: bool,
    pub seller_name: String,
    pub attribution_name: String,
}

/// Current snapshot of one product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductDetail {
    pub product_id: i64,
    pub product_info_id: i64,
    pub product_code: String,
    pub price: Decimal,
    pub is_on_sale: bool,
    pub is_displayed: bool,
    pub name: String,
    pub simple_description: Option<String>,
    pub detail_description: String,
    pub discount_rate: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub is_definite: bool,
    pub min_unit: i32,
    pub max_unit: i32,
    pub seller_id: i64,
    pub first_category_name: String,
    pub second_category_name: String,
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: i64,
    pub image_url: String,
    pub ordering: i32,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductCreate {
    /// Owning seller; sellers may only create for themselves, admins for anyone
    pub seller_id: Option<i64>,
    pub is_on_sale: bool,
    pub is_displayed: bool,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 200))]
    pub simple_description: Option<String>,
    #[validate(length(min = 1))]
    pub detail_description: String,
    pub price: Decimal,
    pub discount_rate: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub discount_start_date: Option<NaiveDateTime>,
    pub discount_end_date: Option<NaiveDateTime>,
    #[validate(range(min = 1, max = 20))]
    pub min_unit: i32,
    #[validate(range(min = 1, max = 20))]
    pub max_unit: i32,
    pub is_stock_managed: bool,
    pub stock_number: Option<i32>,
    pub first_category_id: i64,
    pub second_category_id: i64,
    /// Image URLs returned by the upload endpoint, in display order
    #[validate(length(min = 1, max = 5))]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: i64,
    pub product_info_id: i64,
    pub product_code: String,
}

/// GET /api/products query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductListQuery {
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    /// 0 / 1
    pub is_displayed: Option<i32>,
    /// 0 / 1
    pub is_promotion: Option<i32>,
    /// 0 / 1
    pub is_on_sale: Option<i32>,
    pub seller_attribute_id: Option<i32>,
    /// One of `PRODUCT_NAME`, `PRODUCT_NO`, `PRODUCT_CODE`
    pub search_target: Option<String>,
    pub keyword: Option<String>,
    pub seller_name: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellerSearchQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirstCategoryQuery {
    pub seller_attribute_id: i32,
}
