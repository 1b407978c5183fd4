//! HMAC-SHA256 signing for both directions of the PayOS exchange.
//!
//! Checkout requests are signed over `amount=..&cancelUrl=..&description=..&orderCode=..&returnUrl=..` (keys in
//! alphabetical order). Callbacks are signed over `code|desc|json(data)`, where `data` is serialized compactly with its
//! keys in the order they arrived.
use hmac::{Hmac, Mac};
use lpg_common::Vnd;
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::PayosApiError;

type HmacSha256 = Hmac<Sha256>;

/// The fields that participate in a checkout signature.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutSignatureFields<'a> {
    pub amount: Vnd,
    pub cancel_url: &'a str,
    pub description: &'a str,
    pub order_code: i64,
    pub return_url: &'a str,
}

pub fn checkout_signature_message(fields: &CheckoutSignatureFields<'_>) -> String {
    format!(
        "amount={}&cancelUrl={}&description={}&orderCode={}&returnUrl={}",
        fields.amount.value(),
        fields.cancel_url,
        fields.description,
        fields.order_code,
        fields.return_url
    )
}

pub fn callback_signature_message(code: &str, desc: &str, data: &Map<String, Value>) -> Result<String, PayosApiError> {
    let data = serde_json::to_string(data).map_err(|e| PayosApiError::JsonError(e.to_string()))?;
    Ok(format!("{code}|{desc}|{data}"))
}

/// Lower-case hex HMAC-SHA256 of `message` under `key`.
pub fn hmac_hex(key: &str, message: &str) -> Result<String, PayosApiError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| PayosApiError::Initialization(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn checkout_signature(key: &str, fields: &CheckoutSignatureFields<'_>) -> Result<String, PayosApiError> {
    hmac_hex(key, &checkout_signature_message(fields))
}

pub fn callback_signature(
    key: &str,
    code: &str,
    desc: &str,
    data: &Map<String, Value>,
) -> Result<String, PayosApiError> {
    hmac_hex(key, &callback_signature_message(code, desc, data)?)
}

/// Constant-time comparison of a hex signature against the HMAC of `message`. Malformed hex never matches.
pub fn verify_hex_signature(key: &str, message: &str, signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    match HmacSha256::new_from_slice(key.as_bytes()) {
        Ok(mut mac) => {
            mac.update(message.as_bytes());
            mac.verify_slice(&provided).is_ok()
        },
        Err(_) => false,
    }
}
