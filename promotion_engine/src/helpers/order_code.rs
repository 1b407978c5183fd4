use sha2::{Digest, Sha256};

use crate::db_types::PromotionId;

pub const ORDER_CODE_MIN: i64 = 100_000_000;
pub const ORDER_CODE_MAX: i64 = 999_999_999;
const ORDER_CODE_RANGE: u64 = (ORDER_CODE_MAX - ORDER_CODE_MIN + 1) as u64;

/// Maps a promotion id onto the 9-digit numeric order code the gateway requires.
///
/// The first four bytes of the SHA-256 digest of the id, read as a big-endian integer, are reduced into
/// `[ORDER_CODE_MIN, ORDER_CODE_MAX]`. The mapping is deterministic but not injective. Backends store the result in a
/// unique column and pick a new id if two promotions land on the same code.
pub fn derive_order_code(id: &PromotionId) -> i64 {
    let digest = Sha256::digest(id.as_str().as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    #[allow(clippy::cast_possible_wrap)]
    let offset = (u64::from(prefix) % ORDER_CODE_RANGE) as i64;
    ORDER_CODE_MIN + offset
}

pub fn is_valid_order_code(code: i64) -> bool {
    (ORDER_CODE_MIN..=ORDER_CODE_MAX).contains(&code)
}
