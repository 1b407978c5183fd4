use chrono::{DateTime, Utc};
use lpg_common::Vnd;
use serde::{Deserialize, Serialize};

use crate::db_types::{PackageType, Promotion, PromotionId, PromotionPackage};

pub const PAYMENT_METHOD_PAYOS: &str = "payos";

/// A catalog entry as shown on the pricing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagePricing {
    pub package_type: PackageType,
    pub price: Vnd,
    pub duration_days: i64,
    pub price_per_day: f64,
}

impl From<PromotionPackage> for PackagePricing {
    fn from(p: PromotionPackage) -> Self {
        let price_per_day = p.price_per_day();
        Self { package_type: p.package_type, price: p.price, duration_days: p.duration_days, price_per_day }
    }
}

/// Returned to the seller after a promotion request has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRequestResult {
    pub promotion_id: PromotionId,
    pub amount: Vnd,
    pub package_type: PackageType,
    pub duration_days: i64,
    pub end_date: DateTime<Utc>,
    /// Where the client should go to start paying.
    pub payment_url: String,
}

impl PromotionRequestResult {
    pub fn new(promotion: &Promotion, duration_days: i64) -> Self {
        Self {
            promotion_id: promotion.id.clone(),
            amount: promotion.amount,
            package_type: promotion.package_type,
            duration_days,
            end_date: promotion.end_date,
            payment_url: format!("/promotions/{}/pay", promotion.id),
        }
    }
}

/// Everything a gateway needs to open a checkout for a promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOrder {
    pub promotion_id: PromotionId,
    pub order_code: i64,
    pub amount: Vnd,
    pub description: String,
}

/// A promotion with its derived read-model values, as of `now`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionView {
    #[serde(flatten)]
    pub promotion: Promotion,
    pub is_active: bool,
    pub is_expired: bool,
    pub days_remaining: i64,
}

impl PromotionView {
    pub fn new(promotion: Promotion, now: DateTime<Utc>) -> Self {
        let is_active = promotion.is_live(now);
        let is_expired = promotion.is_expired(now);
        let days_remaining = promotion.days_remaining(now);
        Self { promotion, is_active, is_expired, days_remaining }
    }
}
