//! # PayOS tools
//!
//! Everything that knows about the PayOS wire format lives here:
//!
//! * [`PayosConfig`] loads the merchant credentials and redirect URLs from the environment.
//! * [`signature`] holds the two signing schemes. Outbound checkout requests are signed over sorted `key=value` pairs
//!   joined with `&`. Inbound callbacks are signed over `code|desc|json(data)`. Both use HMAC-SHA256 with the checksum
//!   key. They are different on purpose (it is how the gateway works) and must not be unified.
//! * [`checkout`] validates and signs a payment-link request.
//! * [`callback`] models the callback payload and verifies it.
//! * [`PayosApi`] is the thin HTTP client that posts checkout requests to the gateway.
mod api;
mod config;
mod error;

pub mod callback;
pub mod checkout;
pub mod signature;

pub use api::PayosApi;
pub use callback::{is_successful, verify_callback, CallbackVerification, GatewayCallback, PAID_STATUS, SUCCESS_CODE};
pub use checkout::{build_checkout_request, CheckoutItem, CheckoutRequest, CheckoutResponse, MAX_DESCRIPTION_LEN};
pub use config::PayosConfig;
pub use error::PayosApiError;
