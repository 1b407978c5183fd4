//! # Backend contracts
//!
//! These traits define what a storage backend must provide to drive the promotion engine. The engine's public API
//! ([`crate::PromotionFlowApi`] and [`crate::PricingApi`]) holds all business rules; backends only persist and fetch
//! records, and perform each state transition as a single atomic statement.
//!
//! * [`PricingCatalog`] stores the package price list.
//! * [`ListingDirectory`] is the read-only window onto the marketplace's listings.
//! * [`PromotionManagement`] is the sole writer of promotion records.
//!
//! [`PromotionBackend`] bundles all three, and is implemented for any type that implements them.
mod catalog;
mod listings;
mod promotion_management;

pub use catalog::{CatalogError, PricingCatalog};
pub use listings::ListingDirectory;
pub use promotion_management::{ErrorKind, PromotionError, PromotionManagement};

/// A complete promotion backend.
pub trait PromotionBackend: PromotionManagement + PricingCatalog + ListingDirectory {}

impl<B> PromotionBackend for B where B: PromotionManagement + PricingCatalog + ListingDirectory {}
