//! Types shared between the promotion engine and its storage backends.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use lpg_common::Vnd;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Opaque promotion identifier. Freshly created promotions get a random v4 UUID.
    PromotionId
);
string_id!(
    /// Identifier of a listing. Listings are owned by the marketplace, not by this service.
    ListingId
);
string_id!(
    /// Identifier of the seller (user) who owns a listing.
    SellerId
);

impl PromotionId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

//--------------------------------------     PackageType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    #[serde(alias = "1_day")]
    OneDay,
    #[serde(alias = "3_days")]
    ThreeDays,
    #[serde(alias = "7_days")]
    SevenDays,
}

impl PackageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageType::OneDay => "one_day",
            PackageType::ThreeDays => "three_days",
            PackageType::SevenDays => "seven_days",
        }
    }
}

impl Display for PackageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid package type: {0}")]
pub struct PackageTypeParseError(pub String);

impl FromStr for PackageType {
    type Err = PackageTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "one_day" | "1_day" => Ok(Self::OneDay),
            "three_days" | "3_days" => Ok(Self::ThreeDays),
            "seven_days" | "7_days" => Ok(Self::SevenDays),
            other => Err(PackageTypeParseError(other.to_string())),
        }
    }
}

//--------------------------------------   PromotionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionStatus {
    /// Created, waiting for the payment to settle.
    Pending,
    /// Paid for and visible. Only the sweep moves a promotion out of this state.
    Active,
    Expired,
    /// The payment failed or was abandoned.
    Cancelled,
}

impl Display for PromotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PromotionStatus::Pending => "pending",
            PromotionStatus::Active => "active",
            PromotionStatus::Expired => "expired",
            PromotionStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

//--------------------------------------   PromotionPackage  ---------------------------------------------------------
/// Longest package the catalog accepts.
pub const MAX_PACKAGE_DURATION_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionPackage {
    pub package_type: PackageType,
    pub price: Vnd,
    pub duration_days: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromotionPackage {
    pub fn price_per_day(&self) -> f64 {
        self.price.per(self.duration_days).unwrap_or_default()
    }

    /// `None` if the stored duration is outside `1..=MAX_PACKAGE_DURATION_DAYS`.
    pub fn duration(&self) -> Option<Duration> {
        (1..=MAX_PACKAGE_DURATION_DAYS).contains(&self.duration_days).then(|| Duration::days(self.duration_days))
    }
}

/// A catalog row to be created or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPackage {
    pub package_type: PackageType,
    pub price: Vnd,
    pub duration_days: i64,
    pub is_active: bool,
}

impl NewPackage {
    pub fn new(package_type: PackageType, price: Vnd, duration_days: i64) -> Self {
        Self { package_type, price, duration_days, is_active: true }
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

//--------------------------------------      Promotion      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: PromotionId,
    pub listing_id: ListingId,
    pub seller_id: SellerId,
    pub package_type: PackageType,
    pub amount: Vnd,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
    pub status: PromotionStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    /// The gateway order code. Unique, and fixed once the promotion is created.
    pub payment_reference: i64,
    pub payment_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Active and not yet past its end date.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Active && self.end_date > now
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Expired || self.end_date <= now
    }

    /// Whole days left, rounded up. Zero unless the promotion is live.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_live(now) {
            return 0;
        }
        let secs = (self.end_date - now).num_seconds();
        let day = Duration::days(1).num_seconds();
        (secs + day - 1) / day
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }
}

/// The caller-supplied part of a new promotion. Id, order code and timestamps are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPromotion {
    pub listing_id: ListingId,
    pub seller_id: SellerId,
    pub package_type: PackageType,
    pub amount: Vnd,
    pub end_date: DateTime<Utc>,
}

/// What the gateway told us about a settled payment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: Option<String>,
    pub transaction_id: Option<String>,
}

impl PaymentDetails {
    pub fn new<S1: Into<String>, S2: Into<String>>(method: S1, transaction_id: S2) -> Self {
        Self { method: Some(method.into()), transaction_id: Some(transaction_id.into()) }
    }
}

//--------------------------------------       Listing       ---------------------------------------------------------
pub const LISTING_APPROVED: &str = "approved";

/// The slice of a marketplace listing that promotions care about.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
    pub id: ListingId,
    pub seller_id: SellerId,
    pub status: String,
    pub title: String,
}

impl ListingSummary {
    pub fn is_approved(&self) -> bool {
        self.status.eq_ignore_ascii_case(LISTING_APPROVED)
    }

    pub fn is_owned_by(&self, seller: &SellerId) -> bool {
        &self.seller_id == seller
    }
}
