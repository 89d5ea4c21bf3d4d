//! Coupon Model

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponSummary {
    pub coupon_id: i64,
    pub coupon_name: String,
    pub discount_price: Decimal,
    pub validation_start_date: NaiveDateTime,
    pub validation_end_date: NaiveDateTime,
    pub download_start_date: NaiveDateTime,
    pub download_end_date: NaiveDateTime,
    pub issue_type_name: String,
    pub is_limited: bool,
    pub maximum_number: Option<i32>,
    pub issue_number: i32,
    pub used_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponDetail {
    pub id: i64,
    pub coupon_name: String,
    pub validation_start_date: NaiveDateTime,
    pub validation_end_date: NaiveDateTime,
    pub download_start_date: NaiveDateTime,
    pub download_end_date: NaiveDateTime,
    pub is_limited: bool,
    pub maximum_number: Option<i32>,
    pub discount_price: Decimal,
    pub issue_type_id: i32,
    pub issue_method_id: i32,
    pub description: Option<String>,
    pub min_cost: Decimal,
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_coupon_dates"))]
pub struct CouponCreate {
    #[validate(length(min = 1, max = 20))]
    pub coupon_name: String,
    pub validation_start_date: NaiveDateTime,
    pub validation_end_date: NaiveDateTime,
    pub download_start_date: NaiveDateTime,
    pub download_end_date: NaiveDateTime,
    pub is_limited: bool,
    #[validate(range(min = 1))]
    pub maximum_number: Option<i32>,
    pub issue_type_id: i32,
    pub issue_method_id: i32,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub discount_price: Decimal,
    pub min_cost: Decimal,
}

fn validate_coupon_dates(coupon: &CouponCreate) -> Result<(), ValidationError> {
    if coupon.validation_start_date > coupon.validation_end_date
        || coupon.download_start_date > coupon.download_end_date
    {
        return Err(ValidationError::new("date_range"));
    }
    if coupon.is_limited && coupon.maximum_number.is_none() {
        return Err(ValidationError::new("maximum_number_required"));
    }
    Ok(())
}

/// Update coupon payload (only name and description are editable)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CouponUpdate {
    #[validate(length(min = 1, max = 20))]
    pub coupon_name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// GET /api/coupons query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponListQuery {
    pub coupon_id: Option<i64>,
    pub coupon_name: Option<String>,
    pub validation_start_from: Option<NaiveDate>,
    pub validation_start_to: Option<NaiveDate>,
    pub validation_end_from: Option<NaiveDate>,
    pub validation_end_to: Option<NaiveDate>,
    pub download_start_from: Option<NaiveDate>,
    pub download_start_to: Option<NaiveDate>,
    pub download_end_from: Option<NaiveDate>,
    pub download_end_to: Option<NaiveDate>,
    pub issue_type_id: Option<i32>,
    pub is_limited: Option<bool>,
    pub page: Option<u32>,
}
