use lpg_common::{Secret, Vnd};
use serde::{Deserialize, Serialize};

use crate::{
    signature::{checkout_signature, CheckoutSignatureFields},
    PayosApiError,
};

/// The gateway truncates longer descriptions. We truncate first so that the signature matches what is shown.
pub const MAX_DESCRIPTION_LEN: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckoutItem {
    pub name: String,
    pub quantity: u32,
    pub price: Vnd,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub order_code: i64,
    pub amount: Vnd,
    pub description: String,
    pub cancel_url: String,
    pub return_url: String,
    pub signature: String,
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutData {
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub payment_link_id: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

/// The gateway's envelope for a payment-link response. `code == "00"` means success.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CheckoutResponse {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub data: Option<CheckoutData>,
}

impl CheckoutResponse {
    pub fn checkout_url(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.checkout_url.as_deref()).filter(|s| !s.is_empty())
    }
}

/// Validates and signs a payment-link request.
///
/// The description is truncated to [`MAX_DESCRIPTION_LEN`] characters before signing and must not be blank afterwards.
/// The request carries a single line item with the full amount.
pub fn build_checkout_request(
    checksum_key: &Secret<String>,
    order_code: i64,
    amount: Vnd,
    description: &str,
    return_url: &str,
    cancel_url: &str,
) -> Result<CheckoutRequest, PayosApiError> {
    if !amount.is_positive() {
        return Err(PayosApiError::InvalidAmount(amount.value()));
    }
    let description = description.chars().take(MAX_DESCRIPTION_LEN).collect::<String>();
    if description.trim().is_empty() {
        return Err(PayosApiError::EmptyDescription);
    }
    let fields = CheckoutSignatureFields { amount, cancel_url, description: &description, order_code, return_url };
    let signature = checkout_signature(checksum_key.reveal(), &fields)?;
    let items = vec![CheckoutItem { name: description.clone(), quantity: 1, price: amount }];
    Ok(CheckoutRequest {
        order_code,
        amount,
        description,
        cancel_url: cancel_url.to_string(),
        return_url: return_url.to_string(),
        signature,
        items,
    })
}
