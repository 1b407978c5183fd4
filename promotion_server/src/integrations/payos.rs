//! PayOS payment reconciliation.
//!
//! PayOS tells us about a payment in two ways:
//!
//! * The **webhook**: a server-to-server POST carrying the full, signed callback.
//! * The **return redirect**: the payer's browser comes back from the hosted checkout page with a flat, loosely typed
//!   query string. It usually has no signature and no amount, and the keys are sometimes wrapped as `params[...]` or
//!   spelled in snake_case.
//!
//! Both may arrive, in either order, for the same payment. [`CallbackPayload`] models the two shapes and normalizes
//! them into a single [`GatewayCallback`]. [`PaymentReconciler`] then finds the promotion by its order code and drives
//! the promotion state machine. Activation is idempotent, so it does not matter which channel wins the race.
//!
//! Signature mismatches are logged and the declared status is still acted on.
use std::{collections::HashMap, fmt::Display};

use chrono::Utc;
use log::*;
use lpg_common::{Secret, Vnd};
use payos_tools::{
    callback::CANCELLED_STATUS,
    is_successful,
    verify_callback,
    GatewayCallback,
    PayosApiError,
    PAID_STATUS,
    SUCCESS_CODE,
};
use promotion_engine::{
    db_types::{PaymentDetails, Promotion},
    promotion_objects::PAYMENT_METHOD_PAYOS,
    PromotionBackend,
    PromotionError,
    PromotionFlowApi,
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::data_objects::CallbackResult;

pub const MISSING_ORDER_CODE_MESSAGE: &str =
    "Cannot identify promotion: order code missing from callback. Payment may still arrive via webhook.";
pub const PROMOTION_NOT_FOUND_MESSAGE: &str = "Promotion not found";
pub const PAYMENT_SUCCESSFUL_MESSAGE: &str = "Payment successful";
pub const PROCESSING_ERROR_MESSAGE: &str = "Error processing payment callback";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackChannel {
    Return,
    Webhook,
}

impl Display for CallbackChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Return => write!(f, "return"),
            Self::Webhook => write!(f, "webhook"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CallbackPayload {
    Return(ReturnChannelPayload),
    Webhook(WebhookPayload),
}

impl CallbackPayload {
    pub fn channel(&self) -> CallbackChannel {
        match self {
            Self::Return(_) => CallbackChannel::Return,
            Self::Webhook(_) => CallbackChannel::Webhook,
        }
    }

    /// Converts either shape into the canonical callback that the gateway adapter verifies.
    pub fn normalize(self) -> GatewayCallback {
        match self {
            Self::Return(p) => p.normalize(),
            Self::Webhook(p) => p.0,
        }
    }
}

/// The webhook body. It already has the canonical shape.
#[derive(Debug, Clone)]
pub struct WebhookPayload(pub GatewayCallback);

/// The query parameters of a return redirect.
#[derive(Debug, Clone, Default)]
pub struct ReturnChannelPayload {
    params: HashMap<String, String>,
}

impl ReturnChannelPayload {
    /// Builds the payload from raw query parameters. Keys of the form `params[key]` are unwrapped to `key`.
    pub fn from_query(query: HashMap<String, String>) -> Self {
        let params = query
            .into_iter()
            .map(|(k, v)| {
                let key = k
                    .strip_prefix("params[")
                    .and_then(|k| k.strip_suffix(']'))
                    .map(str::to_string)
                    .unwrap_or(k);
                (key, v)
            })
            .collect();
        Self { params }
    }

    /// The first non-blank value among `keys`.
    fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().filter_map(|k| self.params.get(*k)).map(|v| v.trim()).find(|v| !v.is_empty())
    }

    fn get_i64(&self, keys: &[&str]) -> i64 {
        self.get(keys).and_then(|v| v.parse::<i64>().ok()).unwrap_or_default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.get(&["cancel"]).map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false)
    }

    pub fn normalize(self) -> GatewayCallback {
        let code = self.get(&["code"]).unwrap_or(SUCCESS_CODE).to_string();
        let status = match self.get(&["status"]) {
            Some(s) => s.to_string(),
            None if code == SUCCESS_CODE && !self.is_cancelled() => PAID_STATUS.to_string(),
            None => CANCELLED_STATUS.to_string(),
        };
        let desc = self
            .get(&["desc", "message"])
            .map(str::to_string)
            .unwrap_or_else(|| if code == SUCCESS_CODE { "Success".into() } else { "Failed".into() });
        let mut data = Map::new();
        if let Some(order_code) = self.get(&["orderCode", "order_code"]) {
            let value = order_code.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(order_code));
            data.insert("orderCode".into(), value);
        }
        let amount = self.get_i64(&["amount"]);
        data.insert("amount".into(), Value::from(amount));
        let amount_paid = match self.get_i64(&["amountPaid", "amount_paid"]) {
            0 => amount,
            v => v,
        };
        data.insert("amountPaid".into(), Value::from(amount_paid));
        data.insert("amountRemaining".into(), Value::from(self.get_i64(&["amountRemaining", "amount_remaining"])));
        data.insert("status".into(), Value::from(status));
        if let Some(id) = self.get(&["id"]) {
            data.insert("id".into(), Value::from(id));
        }
        let created_at = self
            .get(&["createdAt", "created_at"])
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        data.insert("createdAt".into(), Value::from(created_at));
        data.insert("transactions".into(), Value::Array(vec![]));
        if let Some(embedded) = self.get(&["data"]) {
            match serde_json::from_str::<Map<String, Value>>(embedded) {
                Ok(embedded) => data.extend(embedded),
                Err(e) => debug!("🔁️ Ignoring unparseable data field in return callback. {e}"),
            }
        }
        let signature = self.get(&["signature"]).map(str::to_string);
        GatewayCallback { code, desc, data, signature }
    }
}

#[derive(Debug, Error)]
enum ReconcileError {
    #[error(transparent)]
    Promotion(#[from] PromotionError),
    #[error(transparent)]
    Gateway(#[from] PayosApiError),
}

/// Matches gateway callbacks to promotions and applies the payment outcome.
pub struct PaymentReconciler<B> {
    api: PromotionFlowApi<B>,
    checksum_key: Secret<String>,
}

impl<B> PaymentReconciler<B> {
    pub fn new(db: B, checksum_key: Secret<String>) -> Self {
        Self { api: PromotionFlowApi::new(db), checksum_key }
    }
}

impl<B: PromotionBackend> PaymentReconciler<B> {
    /// Reconciles a callback from either channel. This never fails: every outcome, including internal errors, is
    /// reported in the returned [`CallbackResult`].
    pub async fn reconcile(&self, payload: CallbackPayload) -> CallbackResult {
        let channel = payload.channel();
        let callback = payload.normalize();
        trace!("🔁️ Reconciling {channel} callback: {callback:?}");
        let Some(order_code) = callback.order_code() else {
            info!("🔁️ {channel} callback has no order code. {MISSING_ORDER_CODE_MESSAGE}");
            return CallbackResult::failure("", MISSING_ORDER_CODE_MESSAGE);
        };
        match self.process(channel, order_code, &callback).await {
            Ok(result) => result,
            Err(e) => {
                error!("🔁️ Error processing {channel} callback for order {order_code}. {e}");
                CallbackResult::failure(order_code, PROCESSING_ERROR_MESSAGE)
            },
        }
    }

    async fn process(
        &self,
        channel: CallbackChannel,
        order_code: i64,
        callback: &GatewayCallback,
    ) -> Result<CallbackResult, ReconcileError> {
        let Some(promotion) = self.api.fetch_by_order_code(order_code).await? else {
            warn!("🔁️ {channel} callback for order {order_code} does not match any promotion");
            return Ok(CallbackResult::failure(order_code, PROMOTION_NOT_FOUND_MESSAGE));
        };
        let verification = verify_callback(&self.checksum_key, callback)?;
        match callback.signature() {
            Some(_) if !verification.is_valid => warn!(
                "🔁️ Signature mismatch on {channel} callback for order {order_code} (promotion {}). Proceeding on the \
                 declared status, {}.",
                promotion.id, verification.status
            ),
            Some(_) => debug!("🔁️ Signature on {channel} callback for order {order_code} is valid"),
            None => debug!("🔁️ {channel} callback for order {order_code} is unsigned. Trusting the declared status."),
        }
        if channel == CallbackChannel::Webhook {
            check_amount(&promotion, &verification.amount);
        }
        let payment = PaymentDetails::new(PAYMENT_METHOD_PAYOS, verification.transaction_id);
        if is_successful(&verification.status) {
            match self.api.activate(&promotion.id, payment).await {
                Ok(p) => {
                    info!("🔁️ Promotion {} is active after {channel} callback for order {order_code}", p.id);
                    Ok(CallbackResult::success(&p.id, PAYMENT_SUCCESSFUL_MESSAGE))
                },
                Err(e @ PromotionError::PromotionExpired(_)) => {
                    warn!("🔁️ Payment received for order {order_code}, but the promotion has already expired. {e}");
                    Ok(CallbackResult::failure(&promotion.id, e))
                },
                Err(e @ PromotionError::ListingAlreadyPromoted { .. }) => {
                    warn!(
                        "🔁️ Payment received for order {order_code}, but listing {} is already promoted. {e}",
                        promotion.listing_id
                    );
                    Ok(CallbackResult::failure(&promotion.id, e))
                },
                Err(e) => Err(e.into()),
            }
        } else {
            let p = self.api.mark_failed(&promotion.id, payment).await?;
            info!(
                "🔁️ Payment for order {order_code} was not completed ({}). Promotion {} is {}",
                verification.status, p.id, p.status
            );
            Ok(CallbackResult::failure(&p.id, format!("Payment failed. Status: {}", verification.status)))
        }
    }
}

fn check_amount(promotion: &Promotion, paid: &Vnd) {
    if paid.is_positive() && paid != &promotion.amount {
        warn!(
            "🔁️ Webhook for promotion {} reports {paid}, but the promotion costs {}",
            promotion.id, promotion.amount
        );
    }
}
