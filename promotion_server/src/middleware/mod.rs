mod hmac;

pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService, INTERNAL_HMAC_HEADER};
