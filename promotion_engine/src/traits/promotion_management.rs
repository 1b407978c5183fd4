use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{ListingId, NewPromotion, PackageType, PaymentDetails, Promotion, PromotionId, PromotionStatus, SellerId},
    traits::CatalogError,
};

/// Coarse classification of promotion errors. Callers map these onto their own error surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    Conflict,
    NotFound,
    Backend,
}

#[derive(Debug, Clone, Error)]
pub enum PromotionError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid promotion request. {0}")]
    ValidationError(String),
    #[error("Listing {0} does not exist")]
    ListingNotFound(ListingId),
    #[error("Promotion package {0} does not exist or is not on sale")]
    PackageNotFound(PackageType),
    #[error("Promotion {0} does not exist")]
    PromotionNotFound(PromotionId),
    #[error("You can only promote your own listings")]
    NotListingOwner,
    #[error("You can only view your own promotions")]
    NotPromotionOwner,
    #[error("Only approved listings can be promoted. Listing {0} is not approved")]
    ListingNotApproved(ListingId),
    #[error("Listing {0} already has an active promotion")]
    ActivePromotionExists(ListingId),
    #[error("Promotion {id} cannot start while listing {listing_id} has another active promotion")]
    ListingAlreadyPromoted { id: PromotionId, listing_id: ListingId },
    #[error("Promotion {0} has expired and cannot be activated")]
    PromotionExpired(PromotionId),
    #[error("Promotion {0} has already been paid for")]
    AlreadyPaid(PromotionId),
    #[error("Promotion {id} cannot move from {from} to {to}")]
    IllegalTransition { id: PromotionId, from: PromotionStatus, to: PromotionStatus },
    #[error("Could not allocate a unique order code after {0} attempts")]
    OrderCodeCollision(usize),
}

impl PromotionError {
    pub fn kind(&self) -> ErrorKind {
        use PromotionError::*;
        match self {
            DatabaseError(_) | OrderCodeCollision(_) => ErrorKind::Backend,
            ValidationError(_) => ErrorKind::Validation,
            ListingNotFound(_) | PackageNotFound(_) | PromotionNotFound(_) => ErrorKind::NotFound,
            NotListingOwner | NotPromotionOwner => ErrorKind::Forbidden,
            ListingNotApproved(_) |
            ActivePromotionExists(_) |
            ListingAlreadyPromoted { .. } |
            PromotionExpired(_) |
            AlreadyPaid(_) |
            IllegalTransition { .. } => ErrorKind::Conflict,
        }
    }
}

impl From<sqlx::Error> for PromotionError {
    fn from(e: sqlx::Error) -> Self {
        PromotionError::DatabaseError(e.to_string())
    }
}

impl From<CatalogError> for PromotionError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(s) => PromotionError::DatabaseError(s),
            CatalogError::PackageNotFound(p) => PromotionError::PackageNotFound(p),
            CatalogError::InvalidPackage(s) => PromotionError::ValidationError(s),
        }
    }
}

/// Storage of promotion records.
///
/// Every method that changes a promotion does so in one atomic statement that re-checks the current status, so
/// concurrent callers (two callback channels, or a callback racing the expiry sweep) cannot lose updates.
#[allow(async_fn_in_trait)]
pub trait PromotionManagement: Clone {
    /// Stores a new `Pending` promotion with a freshly generated id and its derived order code.
    ///
    /// The insert must fail with [`PromotionError::ActivePromotionExists`] if the listing already has an `Active`
    /// promotion whose end date is after `now`. The check and the insert happen atomically.
    async fn insert_promotion(&self, promotion: NewPromotion, now: DateTime<Utc>) -> Result<Promotion, PromotionError>;

    async fn fetch_promotion(&self, id: &PromotionId) -> Result<Option<Promotion>, PromotionError>;

    /// Finds the promotion whose payment reference is exactly `order_code`.
    async fn fetch_promotion_by_reference(&self, order_code: i64) -> Result<Option<Promotion>, PromotionError>;

    /// `Active` promotions with an end date after `now`, optionally restricted to one listing.
    async fn fetch_live_promotions(
        &self,
        listing_id: Option<ListingId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Promotion>, PromotionError>;

    /// All promotions requested by the seller, newest first.
    async fn fetch_promotions_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Promotion>, PromotionError>;

    /// Moves a `Pending` (or `Cancelled`) promotion to `Active` with a completed payment and `start_date = now`.
    ///
    /// Returns `None` without touching the record if it is in any other state, does not exist, or if another
    /// promotion for the same listing is `Active` with an end date after `now`. The check and the update happen
    /// atomically.
    async fn activate_promotion(
        &self,
        id: &PromotionId,
        payment: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, PromotionError>;

    /// Moves a `Pending` promotion to `Cancelled` with a failed payment.
    ///
    /// Returns `None` without touching the record if it is in any other state, or does not exist.
    async fn mark_promotion_failed(
        &self,
        id: &PromotionId,
        payment: &PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Option<Promotion>, PromotionError>;

    /// Moves every `Active` promotion with `end_date <= now` to `Expired` and returns the promotions that changed.
    async fn expire_promotions(&self, now: DateTime<Utc>) -> Result<Vec<Promotion>, PromotionError>;
}
