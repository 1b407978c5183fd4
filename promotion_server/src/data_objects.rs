use std::fmt::Display;

use promotion_engine::db_types::{ListingId, PackageType, PaymentDetails, PromotionId};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of `POST /api/promotions`.
///
/// The package type is kept as a string so that an unknown package is reported as a validation error, rather than a
/// generic deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRequestParams {
    pub listing_id: ListingId,
    pub package_type: String,
}

impl PromotionRequestParams {
    pub fn package_type(&self) -> Result<PackageType, ServerError> {
        self.package_type.parse::<PackageType>().map_err(|e| ServerError::ValidationError(e.to_string()))
    }
}

/// Body of `POST /internal/promotions/activate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRequest {
    pub promotion_id: PromotionId,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl ActivationRequest {
    pub fn payment_details(&self) -> PaymentDetails {
        PaymentDetails { method: self.payment_method.clone(), transaction_id: self.transaction_id.clone() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivePromotionsQuery {
    #[serde(default)]
    pub listing_id: Option<ListingId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUrlResponse {
    pub payment_url: String,
}

/// What both callback channels answer with. Callbacks always get `200 OK`; `success` carries the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackResult {
    pub success: bool,
    pub promotion_id: String,
    pub message: String,
}

impl CallbackResult {
    pub fn success<S: Display>(promotion_id: &PromotionId, message: S) -> Self {
        Self { success: true, promotion_id: promotion_id.to_string(), message: message.to_string() }
    }

    pub fn failure<S1: Display, S2: Display>(promotion_id: S1, message: S2) -> Self {
        Self { success: false, promotion_id: promotion_id.to_string(), message: message.to_string() }
    }
}
