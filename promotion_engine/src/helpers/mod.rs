mod order_code;

pub use order_code::{derive_order_code, is_valid_order_code, ORDER_CODE_MAX, ORDER_CODE_MIN};
