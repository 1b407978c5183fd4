//! Seller identity.
//!
//! Authentication happens in front of this service. The authenticating proxy forwards the seller's id in the
//! `X-Seller-Id` header, and [`SellerIdentity`] extracts it for the `/api` handlers. Requests without it are rejected
//! with `401 Unauthorized`.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::debug;
use promotion_engine::db_types::SellerId;

use crate::errors::ServerError;

pub const SELLER_ID_HEADER: &str = "X-Seller-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SellerIdentity(pub SellerId);

impl SellerIdentity {
    pub fn seller_id(&self) -> &SellerId {
        &self.0
    }

    pub fn into_inner(self) -> SellerId {
        self.0
    }
}

impl FromRequest for SellerIdentity {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let seller = req
            .headers()
            .get(SELLER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| SellerIdentity(SellerId::new(s)));
        let result = seller.ok_or_else(|| {
            debug!("💻️ Request to {} has no seller identity", req.path());
            ServerError::Unauthenticated(format!("Missing {SELLER_ID_HEADER} header"))
        });
        ready(result)
    }
}
