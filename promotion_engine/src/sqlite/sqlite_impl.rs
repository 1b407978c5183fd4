//! `SqliteDatabase` is a concrete implementation of a promotion engine backend.
//!
//! It uses SQLite and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{
    migrate::{MigrateDatabase, MigrateError},
    Sqlite,
    SqlitePool,
};

use super::db::{catalog, db_url, listings, new_pool, promotions};
use crate::{
    db_types::{
        ListingId,
        ListingSummary,
        NewPackage,
        NewPromotion,
        PackageType,
        PaymentDetails,
        Promotion,
        PromotionId,
        PromotionPackage,
        SellerId,
    },
    traits::{CatalogError, ListingDirectory, PricingCatalog, PromotionError, PromotionManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl PricingCatalog for SqliteDatabase {
    async fn fetch_active_packages(&self) -> Result<Vec<PromotionPackage>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let packages = catalog::fetch_active_packages(&mut conn).await?;
        Ok(packages)
    }

    async fn fetch_package(&self, package_type: PackageType) -> Result<Option<PromotionPackage>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let package = catalog::fetch_active_package(package_type, &mut conn).await?;
        Ok(package)
    }

    async fn upsert_package(&self, package: NewPackage) -> Result<PromotionPackage, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let package = catalog::upsert_package(package, Utc::now(), &mut conn).await?;
        debug!("🗃️ Package {} saved", package.package_type);
        Ok(package)
    }
}

impl ListingDirectory for SqliteDatabase {
    async fn fetch_listing(&self, listing_id: &ListingId) -> Result<Option<ListingSummary>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let listing = listings::fetch_listing(listing_id, &mut conn).await?;
        Ok(listing)
    }
}

impl PromotionManagement for SqliteDatabase {
    async fn insert_promotion(&self, promotion: NewPromotion, now: DateTime<Utc>) -> Result<Promotion, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        promotions::insert_promotion(promotion, now, &mut conn).await
    }

    async fn fetch_promotion(&self, id: &PromotionId) -> Result<Option<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let promotion = promotions::fetch_promotion(id, &mut conn).await?;
        Ok(promotion)
    }

    async fn fetch_promotion_by_reference(&self, order_code: i64) -> Result<Option<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let promotion = promotions::fetch_promotion_by_reference(order_code, &mut conn).await?;
        Ok(promotion)
    }

    async fn fetch_live_promotions(
        &self,
        listing_id: Option<ListingId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let result = promotions::fetch_live_promotions(listing_id, now, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_promotions_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let result = promotions::fetch_promotions_for_seller(seller_id, &mut conn).await?;
        Ok(result)
    }

    async fn activate_promotion(
        &self,
        id: &PromotionId,
        payment: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let result = promotions::activate(id, payment, now, &mut conn).await?;
        if result.is_some() {
            debug!("🗃️ Promotion {id} marked as active");
        }
        Ok(result)
    }

    async fn mark_promotion_failed(
        &self,
        id: &PromotionId,
        payment: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let result = promotions::mark_failed(id, payment, now, &mut conn).await?;
        if result.is_some() {
            debug!("🗃️ Promotion {id} marked as cancelled");
        }
        Ok(result)
    }

    async fn expire_promotions(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, PromotionError> {
        let mut conn = self.pool.acquire().await?;
        let result = promotions::expire_promotions(now, &mut conn).await?;
        trace!("🗃️ {} promotions expired", result.len());
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Creates the database file behind `url` if it does not exist yet. Existing databases are left alone.
    pub async fn create_if_missing(url: &str) -> Result<(), sqlx::Error> {
        if !Sqlite::database_exists(url).await? {
            Sqlite::create_database(url).await?;
            info!("🗃️ Created new database at {url}");
        }
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Mirrors a marketplace listing into the local listings table.
    pub async fn upsert_listing(&self, listing: ListingSummary) -> Result<(), PromotionError> {
        let mut conn = self.pool.acquire().await?;
        listings::upsert_listing(listing, &mut conn).await?;
        Ok(())
    }
}
