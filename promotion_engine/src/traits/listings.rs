use crate::{
    db_types::{ListingId, ListingSummary},
    traits::PromotionError,
};

/// Lookup of marketplace listings. Listings are owned elsewhere; the engine only reads them.
#[allow(async_fn_in_trait)]
pub trait ListingDirectory: Clone {
    async fn fetch_listing(&self, listing_id: &ListingId) -> Result<Option<ListingSummary>, PromotionError>;
}
