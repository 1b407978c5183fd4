use std::sync::Arc;

use log::*;
use lpg_common::Vnd;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{
    callback::SUCCESS_CODE,
    checkout::{build_checkout_request, CheckoutResponse},
    PayosApiError,
    PayosConfig,
};

#[derive(Clone)]
pub struct PayosApi {
    config: PayosConfig,
    client: Arc<Client>,
}

impl PayosApi {
    pub fn new(config: PayosConfig) -> Result<Self, PayosApiError> {
        let mut headers = HeaderMap::with_capacity(3);
        let client_id =
            HeaderValue::from_str(&config.client_id).map_err(|e| PayosApiError::Initialization(e.to_string()))?;
        let mut api_key = HeaderValue::from_str(config.api_key.reveal().as_str())
            .map_err(|e| PayosApiError::Initialization(e.to_string()))?;
        api_key.set_sensitive(true);
        headers.insert("x-client-id", client_id);
        headers.insert("x-api-key", api_key);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| PayosApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PayosConfig {
        &self.config
    }

    /// Requests a hosted checkout page for `order_code` and returns its URL.
    pub async fn create_payment_link(
        &self,
        order_code: i64,
        amount: Vnd,
        description: &str,
    ) -> Result<String, PayosApiError> {
        if !self.config.has_credentials() {
            return Err(PayosApiError::MissingCredentials);
        }
        let request = build_checkout_request(
            &self.config.checksum_key,
            order_code,
            amount,
            description,
            &self.config.return_url,
            &self.config.cancel_url,
        )?;
        debug!("💳️ Requesting payment link for order {order_code} ({amount})");
        let response = self.client.post(&self.config.api_url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!("💳️ Payment link response ({status}): {body}");
        let parsed = serde_json::from_str::<CheckoutResponse>(&body);
        match parsed {
            Ok(resp) if status.is_success() && resp.code == SUCCESS_CODE => match resp.checkout_url() {
                Some(url) => {
                    info!("💳️ Payment link created for order {order_code}");
                    Ok(url.to_string())
                },
                None => Err(PayosApiError::RestResponseError("Response did not contain a checkout URL".into())),
            },
            Ok(resp) if !resp.code.is_empty() => {
                warn!("💳️ Gateway rejected payment link for order {order_code}. {} {}", resp.code, resp.desc);
                Err(PayosApiError::GatewayRejected { code: resp.code, desc: resp.desc })
            },
            Ok(_) | Err(_) if !status.is_success() => {
                Err(PayosApiError::QueryError { status: status.as_u16(), message: body })
            },
            Ok(_) => Err(PayosApiError::RestResponseError("Response did not contain a status code".into())),
            Err(e) => Err(PayosApiError::JsonError(e.to_string())),
        }
    }
}
