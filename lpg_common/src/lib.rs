mod vnd;

pub mod helpers;
pub mod op;
mod secret;

pub use vnd::{Vnd, VndConversionError, VND_CURRENCY_CODE};
pub use secret::Secret;
