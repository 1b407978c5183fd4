use std::{env, time::Duration};

use log::*;
use lpg_common::Secret;

pub const DEFAULT_PAYOS_API_URL: &str = "https://api-merchant.payos.vn/v2/payment-requests";
pub const DEFAULT_RETURN_URL: &str = "http://localhost:5173/promotions/payos-callback";
pub const DEFAULT_CANCEL_URL: &str = "http://localhost:5173/promotions/payos-callback?status=cancelled";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct PayosConfig {
    pub client_id: String,
    pub api_key: Secret<String>,
    /// The key used for both the checkout and the callback signatures.
    pub checksum_key: Secret<String>,
    pub api_url: String,
    pub return_url: String,
    pub cancel_url: String,
    /// Upper bound on any single request to the gateway.
    pub timeout: Duration,
}

impl Default for PayosConfig {
    fn default() -> Self {
        Self {
            client_id: String::default(),
            api_key: Secret::default(),
            checksum_key: Secret::default(),
            api_url: DEFAULT_PAYOS_API_URL.to_string(),
            return_url: DEFAULT_RETURN_URL.to_string(),
            cancel_url: DEFAULT_CANCEL_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PayosConfig {
    pub fn new_from_env_or_default() -> Self {
        let client_id = env::var("LPG_PAYOS_CLIENT_ID").unwrap_or_else(|_| {
            warn!("💳️ LPG_PAYOS_CLIENT_ID not set. Checkout links cannot be created until it is.");
            String::default()
        });
        let api_key = Secret::new(env::var("LPG_PAYOS_API_KEY").unwrap_or_else(|_| {
            warn!("💳️ LPG_PAYOS_API_KEY not set. Checkout links cannot be created until it is.");
            String::default()
        }));
        let checksum_key = Secret::new(env::var("LPG_PAYOS_CHECKSUM_KEY").unwrap_or_else(|_| {
            warn!("💳️ LPG_PAYOS_CHECKSUM_KEY not set. Callback signatures cannot be verified.");
            String::default()
        }));
        let api_url = env::var("LPG_PAYOS_API_URL").unwrap_or_else(|_| DEFAULT_PAYOS_API_URL.to_string());
        let return_url = env::var("LPG_PAYOS_RETURN_URL").unwrap_or_else(|_| {
            info!("💳️ LPG_PAYOS_RETURN_URL not set, using {DEFAULT_RETURN_URL}");
            DEFAULT_RETURN_URL.to_string()
        });
        let cancel_url = env::var("LPG_PAYOS_CANCEL_URL").unwrap_or_else(|_| {
            info!("💳️ LPG_PAYOS_CANCEL_URL not set, using {DEFAULT_CANCEL_URL}");
            DEFAULT_CANCEL_URL.to_string()
        });
        let timeout = env::var("LPG_PAYOS_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("💳️ Invalid value for LPG_PAYOS_TIMEOUT ({s}). {e}"))
                    .ok()
            })
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self { client_id, api_key, checksum_key, api_url, return_url, cancel_url, timeout }
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.api_key.reveal().is_empty() && !self.checksum_key.reveal().is_empty()
    }
}
