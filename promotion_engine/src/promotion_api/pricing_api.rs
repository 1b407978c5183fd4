use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewPackage, PackageType, PromotionPackage, MAX_PACKAGE_DURATION_DAYS},
    promotion_api::promotion_objects::PackagePricing,
    traits::{CatalogError, PricingCatalog},
};

/// Read access to the package price list, plus the administrative upsert used to maintain it.
pub struct PricingApi<B> {
    db: B,
}

impl<B> Debug for PricingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PricingApi")
    }
}

impl<B> PricingApi<B>
where B: PricingCatalog
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Packages on sale, shortest first, with their price per day.
    pub async fn list_active(&self) -> Result<Vec<PackagePricing>, CatalogError> {
        let packages = self.db.fetch_active_packages().await?;
        Ok(packages.into_iter().map(PackagePricing::from).collect())
    }

    pub async fn find_by_type(&self, package_type: PackageType) -> Result<PromotionPackage, CatalogError> {
        self.db.fetch_package(package_type).await?.ok_or(CatalogError::PackageNotFound(package_type))
    }

    /// Changing a package never alters promotions that were already created from it.
    pub async fn upsert_package(&self, package: NewPackage) -> Result<PromotionPackage, CatalogError> {
        if !package.price.is_positive() {
            return Err(CatalogError::InvalidPackage(format!("price must be positive, got {}", package.price)));
        }
        if !(1..=MAX_PACKAGE_DURATION_DAYS).contains(&package.duration_days) {
            return Err(CatalogError::InvalidPackage(format!(
                "duration must be between 1 and {MAX_PACKAGE_DURATION_DAYS} days, got {}",
                package.duration_days
            )));
        }
        let package = self.db.upsert_package(package).await?;
        info!(
            "📣️ Package {} set to {} for {} days (active: {})",
            package.package_type, package.price, package.duration_days, package.is_active
        );
        Ok(package)
    }
}
