//! Promotion Engine
//!
//! The promotion engine manages paid promotions for marketplace listings. A seller picks a package from the price
//! list, pays for it through an external gateway, and the listing is promoted until the package runs out. This
//! library contains the core logic and is gateway-agnostic: it knows about order codes, but not about how a gateway
//! signs or delivers its callbacks.
//!
//! The library is divided into three parts:
//! 1. The backend contracts ([`mod@traits`]) and a SQLite implementation of them ([`SqliteDatabase`]). You should
//!    not need to talk to the backend directly. The exception is the data types used in the database, which are
//!    defined in [`mod@db_types`] and are public.
//! 2. The public API. [`PricingApi`] reads the package catalog. [`PromotionFlowApi`] owns the promotion state machine:
//!    requests, activation, failed payments, the expiry sweep and the read paths.
//! 3. [`mod@helpers`], most importantly the mapping from promotion ids to the numeric order codes gateways require.
pub mod db_types;
pub mod helpers;
mod promotion_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use promotion_api::{pricing_api::PricingApi, promotion_flow_api::PromotionFlowApi, promotion_objects};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    CatalogError,
    ErrorKind,
    ListingDirectory,
    PricingCatalog,
    PromotionBackend,
    PromotionError,
    PromotionManagement,
};
