use thiserror::Error;

use crate::db_types::{NewPackage, PackageType, PromotionPackage};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Promotion package {0} does not exist or is not on sale")]
    PackageNotFound(PackageType),
    #[error("Invalid package definition. {0}")]
    InvalidPackage(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// The administered price list. It is read-mostly; promotions copy what they need from it at creation time.
#[allow(async_fn_in_trait)]
pub trait PricingCatalog: Clone {
    /// All packages currently on sale, shortest duration first.
    async fn fetch_active_packages(&self) -> Result<Vec<PromotionPackage>, CatalogError>;

    /// The package of the given type, if it exists and is on sale.
    async fn fetch_package(&self, package_type: PackageType) -> Result<Option<PromotionPackage>, CatalogError>;

    /// Creates the package, or replaces the price, duration and availability of an existing one.
    async fn upsert_package(&self, package: NewPackage) -> Result<PromotionPackage, CatalogError>;
}
