use log::*;
use lpg_common::{Secret, Vnd};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    signature::{callback_signature_message, verify_hex_signature},
    PayosApiError,
};

pub const SUCCESS_CODE: &str = "00";
pub const PAID_STATUS: &str = "PAID";
pub const CANCELLED_STATUS: &str = "CANCELLED";

/// A gateway callback, in the shape the webhook delivers it. Return-channel callbacks are normalized into this shape
/// before they are verified.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GatewayCallback {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl GatewayCallback {
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// The order code, whether the gateway sent it as a number or as a string. Zero is treated as absent.
    pub fn order_code(&self) -> Option<i64> {
        let code = match self.data.get("orderCode")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        code.filter(|&c| c != 0)
    }

    /// The payment status. If the data carries no status, a success code implies `PAID`.
    pub fn status(&self) -> String {
        match self.data.get("status").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            Some(s) => s.to_string(),
            None if self.code == SUCCESS_CODE => PAID_STATUS.to_string(),
            None => CANCELLED_STATUS.to_string(),
        }
    }

    /// `amount`, falling back to `amountPaid`, falling back to zero.
    pub fn amount(&self) -> Vnd {
        ["amount", "amountPaid"]
            .iter()
            .filter_map(|k| self.data.get(*k))
            .filter_map(value_as_i64)
            .find(|&v| v != 0)
            .map(Vnd::from)
            .unwrap_or_default()
    }

    /// The gateway's reference for the transaction, or the order code if it sent none.
    pub fn transaction_id(&self) -> String {
        ["reference", "paymentLinkId", "id"]
            .iter()
            .filter_map(|k| self.data.get(*k))
            .filter_map(value_as_string)
            .find(|s| !s.is_empty())
            .or_else(|| self.order_code().map(|c| c.to_string()))
            .unwrap_or_default()
    }
}

fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn value_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CallbackVerification {
    pub is_valid: bool,
    /// The order code as a string. This is the promotion's payment reference.
    pub order_id: String,
    pub amount: Vnd,
    pub transaction_id: String,
    pub status: String,
}

/// Checks a callback against the checksum key and extracts the fields reconciliation needs.
///
/// With a signature present, validity is the result of the constant-time signature check. Without one, the callback
/// is taken at its word: it is valid if it reports `PAID` or the success code.
pub fn verify_callback(
    checksum_key: &Secret<String>,
    callback: &GatewayCallback,
) -> Result<CallbackVerification, PayosApiError> {
    let order_code = callback.order_code().ok_or(PayosApiError::MissingOrderCode)?;
    let status = callback.status();
    let is_valid = match callback.signature() {
        Some(signature) => {
            let message = callback_signature_message(&callback.code, &callback.desc, &callback.data)?;
            let valid = verify_hex_signature(checksum_key.reveal(), &message, signature);
            if !valid {
                debug!("💳️ Callback signature for order {order_code} did not match");
            }
            valid
        },
        None => status == PAID_STATUS || callback.code == SUCCESS_CODE,
    };
    Ok(CallbackVerification {
        is_valid,
        order_id: order_code.to_string(),
        amount: callback.amount(),
        transaction_id: callback.transaction_id(),
        status,
    })
}

pub fn is_successful(status: &str) -> bool {
    status == PAID_STATUS
}
