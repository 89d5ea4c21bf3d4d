//! Seller Model
//!
//! `seller_info` is bitemporal like `order_item_info`: a profile edit closes
//! the open row and inserts a successor.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `seller_status` id every new seller starts in
pub const SELLER_STATUS_PENDING: i32 = 1;

/// Resolved principal for the auth gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerAccount {
    pub id: i64,
    pub is_admin: bool,
    pub is_deleted: bool,
    /// Manager of the open profile; admins may have none
    pub manager_id: Option<i64>,
}

/// Credentials row for login
#[derive(Debug, Clone)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerCredentials {
    pub seller_id: i64,
    pub password: String,
}

/// Open `seller_info` interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerProfile {
    pub id: i64,
    pub seller_id: i64,
    pub login_id: String,
    pub korean_name: String,
    pub eng_name: String,
    pub service_center_phone: String,
    pub site_url: String,
    pub image_url: Option<String>,
    pub seller_attribute_id: i32,
    pub seller_status_id: i32,
    pub manager_id: i64,
    pub modifier_id: Option<i64>,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
}

/// Row of the seller list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerSummary {
    pub seller_id: i64,
    pub login_id: String,
    pub eng_name: String,
    pub korean_name: String,
    pub manager_name: Option<String>,
    pub seller_status_id: i32,
    pub manager_phone: String,
    pub manager_email: Option<String>,
    pub seller_attribute_id: i32,
    pub product_count: i64,
    pub site_url: String,
    pub registered_at: NaiveDateTime,
}

/// Seller profile history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerHistoryEntry {
    pub seller_status_id: i32,
    pub korean_name: String,
    pub modifier_id: Option<i64>,
    pub valid_from: NaiveDateTime,
    pub valid_to: NaiveDateTime,
}

/// Seller name lookup used by the product form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerLookup {
    pub seller_id: i64,
    pub korean_name: String,
    pub image_url: Option<String>,
    pub seller_attribute_id: i32,
}

/// Signup payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SellerSignup {
    #[validate(length(min = 5, max = 20))]
    pub login_id: String,
    #[validate(length(min = 8, max = 64))]
    pub password: String,
    #[validate(length(min = 9, max = 20))]
    pub manager_phone: String,
    #[validate(length(min = 1, max = 45))]
    pub korean_name: String,
    #[validate(length(min = 1, max = 45))]
    pub eng_name: String,
    #[validate(length(min = 9, max = 20))]
    pub service_center_phone: String,
    #[validate(url)]
    pub site_url: String,
    #[validate(range(min = 1, max = 7))]
    pub seller_attribute_id: i32,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SellerLogin {
    #[validate(length(min = 1))]
    pub login_id: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub seller_id: i64,
    pub is_admin: bool,
}

/// Profile edit; absent fields are carried over from the current interval.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SellerProfileUpdate {
    #[validate(length(min = 1, max = 45))]
    pub korean_name: Option<String>,
    #[validate(length(min = 1, max = 45))]
    pub eng_name: Option<String>,
    #[validate(length(min = 9, max = 20))]
    pub service_center_phone: Option<String>,
    #[validate(url)]
    pub site_url: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(range(min = 1, max = 7))]
    pub seller_attribute_id: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub seller_status_id: Option<i32>,
}

impl SellerProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.korean_name.is_none()
            && self.eng_name.is_none()
            && self.service_center_phone.is_none()
            && self.site_url.is_none()
            && self.image_url.is_none()
            && self.seller_attribute_id.is_none()
            && self.seller_status_id.is_none()
    }

    /// Successor interval: current profile with the edited fields replaced.
    pub fn apply_to(&self, current: &SellerProfile) -> SellerProfile {
        SellerProfile {
            korean_name: self
                .korean_name
                .clone()
                .unwrap_or_else(|| current.korean_name.clone()),
            eng_name: self
                .eng_name
                .clone()
                .unwrap_or_else(|| current.eng_name.clone()),
            service_center_phone: self
                .service_center_phone
                .clone()
                .unwrap_or_else(|| current.service_center_phone.clone()),
            site_url: self
                .site_url
                .clone()
                .unwrap_or_else(|| current.site_url.clone()),
            image_url: self.image_url.clone().or_else(|| current.image_url.clone()),
            seller_attribute_id: self
                .seller_attribute_id
                .unwrap_or(current.seller_attribute_id),
            seller_status_id: self.seller_status_id.unwrap_or(current.seller_status_id),
            ..current.clone()
        }
    }
}

/// GET /api/sellers query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellerListQuery {
    pub seller_id: Option<i64>,
    pub login_id: Option<String>,
    pub eng_name: Option<String>,
    pub korean_name: Option<String>,
    pub manager_name: Option<String>,
    pub manager_phone: Option<String>,
    pub manager_email: Option<String>,
    pub seller_status_id: Option<i32>,
    pub seller_attribute_id: Option<i32>,
    pub registered_from: Option<NaiveDate>,
    pub registered_to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerListResponse {
    pub sellers: Vec<SellerSummary>,
    pub total_count: i64,
    pub filtered_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> SellerProfile {
        let t = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
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
            start_date: t,
            end_date: crate::util::open_end(),
        }
    }

    #[test]
    fn test_apply_to_carries_unedited_fields() {
        let current = profile();
        let update = SellerProfileUpdate {
            eng_name: Some("brandi-store".into()),
            seller_status_id: Some(2),
            ..Default::default()
        };
        let next = update.apply_to(&current);
        assert_eq!(next.eng_name, "brandi-store");
        assert_eq!(next.seller_status_id, 2);
        assert_eq!(next.korean_name, current.korean_name);
        assert_eq!(next.login_id, current.login_id);
        assert_eq!(next.manager_id, current.manager_id);
    }

    #[test]
    fn test_empty_update() {
        assert!(SellerProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_signup_validation() {
        let signup = SellerSignup {
            login_id: "abc".into(),
            password: "short".into(),
            manager_phone: "01012345678".into(),
            korean_name: "셀러".into(),
            eng_name: "seller".into(),
            service_center_phone: "0212345678".into(),
            site_url: "not a url".into(),
            seller_attribute_id: 9,
        };
        let errors = signup.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("login_id"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("site_url"));
        assert!(fields.contains_key("seller_attribute_id"));
        assert!(!fields.contains_key("korean_name"));
    }
}
