use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{ListingId, NewPromotion, PackageType, PaymentDetails, Promotion, PromotionId, PromotionStatus, SellerId},
    promotion_api::promotion_objects::{CheckoutOrder, PromotionRequestResult},
    traits::{ListingDirectory, PricingCatalog, PromotionError, PromotionManagement},
};

/// `PromotionFlowApi` owns the promotion state machine.
///
/// ```text
///   Pending ──payment ok──▶ Active ──sweep──▶ Expired
///      │
///      └──payment failed──▶ Cancelled
/// ```
///
/// All writes go through here. Transitions are idempotent: replaying a callback leaves the record as it was after the
/// first delivery.
pub struct PromotionFlowApi<B> {
    db: B,
}

impl<B> Debug for PromotionFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PromotionFlowApi")
    }
}

impl<B> PromotionFlowApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> PromotionFlowApi<B>
where B: PromotionManagement + PricingCatalog + ListingDirectory
{
    /// Request a promotion for a listing.
    ///
    /// The listing must exist, belong to `seller_id` and be approved. The package must be on sale, and the listing must
    /// not already have a live promotion. The price and end date are fixed here and never change afterwards.
    pub async fn create_request(
        &self,
        listing_id: &ListingId,
        package_type: PackageType,
        seller_id: &SellerId,
    ) -> Result<PromotionRequestResult, PromotionError> {
        self.create_request_at(listing_id, package_type, seller_id, Utc::now()).await
    }

    pub async fn create_request_at(
        &self,
        listing_id: &ListingId,
        package_type: PackageType,
        seller_id: &SellerId,
        now: DateTime<Utc>,
    ) -> Result<PromotionRequestResult, PromotionError> {
        let listing =
            self.db.fetch_listing(listing_id).await?.ok_or_else(|| PromotionError::ListingNotFound(listing_id.clone()))?;
        if !listing.is_owned_by(seller_id) {
            warn!("📣️ Seller {seller_id} tried to promote listing {listing_id}, which belongs to {}", listing.seller_id);
            return Err(PromotionError::NotListingOwner);
        }
        if !listing.is_approved() {
            return Err(PromotionError::ListingNotApproved(listing_id.clone()));
        }
        let package = self.db.fetch_package(package_type).await?.ok_or(PromotionError::PackageNotFound(package_type))?;
        let duration = package.duration().ok_or_else(|| {
            PromotionError::ValidationError(format!(
                "Package {package_type} has an unusable duration of {} days",
                package.duration_days
            ))
        })?;
        let new_promotion = NewPromotion {
            listing_id: listing_id.clone(),
            seller_id: seller_id.clone(),
            package_type,
            amount: package.price,
            end_date: now + duration,
        };
        let promotion = self.db.insert_promotion(new_promotion, now).await?;
        info!(
            "📣️ Promotion {} requested for listing {listing_id}. {} for {} days, order code {}",
            promotion.id, promotion.amount, package.duration_days, promotion.payment_reference
        );
        Ok(PromotionRequestResult::new(&promotion, package.duration_days))
    }

    /// Marks the promotion as paid and starts it.
    ///
    /// Activating an `Active` promotion is a no-op that returns it unchanged. An `Expired` promotion cannot be
    /// brought back, and yields [`PromotionError::PromotionExpired`]. A listing has at most one live promotion, so
    /// paying for a second request while the first is still running yields [`PromotionError::ListingAlreadyPromoted`]
    /// and leaves the second one as it was.
    pub async fn activate(&self, id: &PromotionId, payment: PaymentDetails) -> Result<Promotion, PromotionError> {
        self.activate_at(id, payment, Utc::now()).await
    }

    pub async fn activate_at(
        &self,
        id: &PromotionId,
        payment: PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Promotion, PromotionError> {
        if let Some(promotion) = self.db.activate_promotion(id, &payment, now).await? {
            info!("📣️ Promotion {id} is now active until {}", promotion.end_date);
            return Ok(promotion);
        }
        let promotion = self.db.fetch_promotion(id).await?.ok_or_else(|| PromotionError::PromotionNotFound(id.clone()))?;
        match promotion.status {
            PromotionStatus::Active => {
                debug!("📣️ Promotion {id} was already active. Nothing to do.");
                Ok(promotion)
            },
            PromotionStatus::Expired => {
                warn!("📣️ Refusing to activate promotion {id}, which has already expired");
                Err(PromotionError::PromotionExpired(id.clone()))
            },
            PromotionStatus::Pending | PromotionStatus::Cancelled => {
                let live = self.db.fetch_live_promotions(Some(promotion.listing_id.clone()), now).await?;
                match live.into_iter().find(|p| p.id != promotion.id) {
                    Some(other) => {
                        warn!(
                            "📣️ Refusing to activate promotion {id}. Listing {} is already promoted by {} until {}",
                            promotion.listing_id, other.id, other.end_date
                        );
                        Err(PromotionError::ListingAlreadyPromoted { id: id.clone(), listing_id: promotion.listing_id })
                    },
                    None => Err(PromotionError::IllegalTransition {
                        id: id.clone(),
                        from: promotion.status,
                        to: PromotionStatus::Active,
                    }),
                }
            },
        }
    }

    /// Records a failed payment and cancels the promotion. Promotions that are not `Pending` are returned untouched.
    pub async fn mark_failed(&self, id: &PromotionId, payment: PaymentDetails) -> Result<Promotion, PromotionError> {
        if let Some(promotion) = self.db.mark_promotion_failed(id, &payment, Utc::now()).await? {
            info!("📣️ Payment for promotion {id} failed. The promotion has been cancelled.");
            return Ok(promotion);
        }
        let promotion = self.db.fetch_promotion(id).await?.ok_or_else(|| PromotionError::PromotionNotFound(id.clone()))?;
        debug!("📣️ Ignoring failed payment for promotion {id}, which is {}", promotion.status);
        Ok(promotion)
    }

    /// Expires every active promotion whose end date is at or before `now`. Returns the number expired.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, PromotionError> {
        let expired = self.db.expire_promotions(now).await?;
        for p in &expired {
            debug!("📣️ Promotion {} for listing {} expired at {}", p.id, p.listing_id, p.end_date);
        }
        if !expired.is_empty() {
            info!("📣️ {} promotions expired", expired.len());
        }
        Ok(expired.len())
    }

    /// Live promotions, optionally for a single listing.
    pub async fn find_active(&self, listing_id: Option<ListingId>) -> Result<Vec<Promotion>, PromotionError> {
        self.db.fetch_live_promotions(listing_id, Utc::now()).await
    }

    /// Used by display layers to badge promoted listings.
    pub async fn active_promotions_for_listing(&self, listing_id: &ListingId) -> Result<Vec<Promotion>, PromotionError> {
        self.find_active(Some(listing_id.clone())).await
    }

    pub async fn list_for_seller(&self, seller_id: &SellerId) -> Result<Vec<Promotion>, PromotionError> {
        self.db.fetch_promotions_for_seller(seller_id).await
    }

    /// Fetches a promotion. If `requester` is given, it must be the seller that owns the promotion.
    pub async fn get_details(
        &self,
        id: &PromotionId,
        requester: Option<&SellerId>,
    ) -> Result<Promotion, PromotionError> {
        let promotion = self.db.fetch_promotion(id).await?.ok_or_else(|| PromotionError::PromotionNotFound(id.clone()))?;
        match requester {
            Some(seller) if seller != &promotion.seller_id => Err(PromotionError::NotPromotionOwner),
            _ => Ok(promotion),
        }
    }

    pub async fn fetch_by_order_code(&self, order_code: i64) -> Result<Option<Promotion>, PromotionError> {
        self.db.fetch_promotion_by_reference(order_code).await
    }

    /// Collects what a gateway needs to open a checkout for the promotion.
    ///
    /// Promotions belonging to someone else are reported as not found. A promotion that is already paid for is
    /// rejected.
    pub async fn prepare_checkout(
        &self,
        id: &PromotionId,
        requester: &SellerId,
    ) -> Result<CheckoutOrder, PromotionError> {
        let promotion = self
            .db
            .fetch_promotion(id)
            .await?
            .filter(|p| &p.seller_id == requester)
            .ok_or_else(|| PromotionError::PromotionNotFound(id.clone()))?;
        if promotion.is_paid() {
            return Err(PromotionError::AlreadyPaid(id.clone()));
        }
        let title = self
            .db
            .fetch_listing(&promotion.listing_id)
            .await?
            .map(|l| l.title)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| promotion.id.to_string());
        Ok(CheckoutOrder {
            promotion_id: promotion.id,
            order_code: promotion.payment_reference,
            amount: promotion.amount,
            description: format!("Promote listing: {title}"),
        })
    }
}
