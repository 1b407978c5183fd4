use chrono::{DateTime, Duration, TimeZone, Utc};
use lpg_common::Vnd;
use mockall::mock;
use promotion_engine::{
    db_types::{
        ListingId,
        ListingSummary,
        NewPackage,
        NewPromotion,
        PackageType,
        PaymentDetails,
        PaymentStatus,
        Promotion,
        PromotionId,
        PromotionPackage,
        PromotionStatus,
        SellerId,
    },
    CatalogError,
    ListingDirectory,
    PricingCatalog,
    PromotionError,
    PromotionManagement,
};

mock! {
    pub Backend {}
    impl Clone for Backend {
        fn clone(&self) -> Self;
    }
    impl PromotionManagement for Backend {
        async fn insert_promotion(&self, promotion: NewPromotion, now: DateTime<Utc>) -> Result<Promotion, PromotionError>;
        async fn fetch_promotion(&self, id: &PromotionId) -> Result<Option<Promotion>, PromotionError>;
        async fn fetch_promotion_by_reference(&self, order_code: i64) -> Result<Option<Promotion>, PromotionError>;
        async fn fetch_live_promotions(&self, listing_id: Option<ListingId>, now: DateTime<Utc>) -> Result<Vec<Promotion>, PromotionError>;
        async fn fetch_promotions_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Promotion>, PromotionError>;
        async fn activate_promotion(&self, id: &PromotionId, payment: &PaymentDetails, now: DateTime<Utc>) -> Result<Option<Promotion>, PromotionError>;
        async fn mark_promotion_failed(&self, id: &PromotionId, payment: &PaymentDetails, now: DateTime<Utc>) -> Result<Option<Promotion>, PromotionError>;
        async fn expire_promotions(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, PromotionError>;
    }
    impl PricingCatalog for Backend {
        async fn fetch_active_packages(&self) -> Result<Vec<PromotionPackage>, CatalogError>;
        async fn fetch_package(&self, package_type: PackageType) -> Result<Option<PromotionPackage>, CatalogError>;
        async fn upsert_package(&self, package: NewPackage) -> Result<PromotionPackage, CatalogError>;
    }
    impl ListingDirectory for Backend {
        async fn fetch_listing(&self, listing_id: &ListingId) -> Result<Option<ListingSummary>, PromotionError>;
    }
}

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
}

pub fn package(package_type: PackageType, price: i64, days: i64) -> PromotionPackage {
    PromotionPackage {
        package_type,
        price: Vnd::from(price),
        duration_days: days,
        is_active: true,
        created_at: created_at(),
        updated_at: created_at(),
    }
}

pub fn listing(id: &str, seller: &str, status: &str) -> ListingSummary {
    ListingSummary {
        id: ListingId::new(id),
        seller_id: SellerId::new(seller),
        status: status.to_string(),
        title: format!("Listing {id}"),
    }
}

/// A pending seven-day promotion for listing L1, owned by S1.
pub fn pending_promotion(id: &str) -> Promotion {
    Promotion {
        id: PromotionId::new(id),
        listing_id: ListingId::new("L1"),
        seller_id: SellerId::new("S1"),
        package_type: PackageType::SevenDays,
        amount: Vnd::from(700_000),
        start_date: None,
        end_date: created_at() + Duration::days(7),
        status: PromotionStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_method: None,
        payment_reference: 123_456_789,
        payment_transaction_id: None,
        created_at: created_at(),
        updated_at: created_at(),
    }
}

/// The same promotion, paid for and running until a week from now.
pub fn live_promotion(id: &str) -> Promotion {
    let now = Utc::now();
    Promotion {
        start_date: Some(now),
        end_date: now + Duration::days(7),
        status: PromotionStatus::Active,
        payment_status: PaymentStatus::Completed,
        payment_method: Some("payos".into()),
        payment_transaction_id: Some("FT0001".into()),
        updated_at: now,
        ..pending_promotion(id)
    }
}
