//! Shapes of the display-safe codes minted for transactions and refunds.

use super::payment::PaymentMethod;

pub const REFERENCE_LEN: usize = 16;
pub const TRANSACTION_CODE_LEN: usize = 12;
pub const AUTHORIZATION_SUFFIX_LEN: usize = 6;
pub const REFUND_CODE_LEN: usize = 12;
pub const REFUND_CODE_PREFIX: &str = "RF";

pub fn is_code(value: &str, len: usize) -> bool {
    value.len() == len
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

pub fn is_reference(value: &str) -> bool {
    is_code(value, REFERENCE_LEN)
}

pub fn is_transaction_code(value: &str) -> bool {
    is_code(value, TRANSACTION_CODE_LEN)
}

pub fn is_authorization_code(value: &str, method: PaymentMethod) -> bool {
    value
        .strip_prefix(method.code_prefix())
        .is_some_and(|suffix| is_code(suffix, AUTHORIZATION_SUFFIX_LEN))
}

pub fn is_refund_code(value: &str) -> bool {
    value.len() == REFUND_CODE_LEN
        && value
            .strip_prefix(REFUND_CODE_PREFIX)
            .is_some_and(|suffix| is_code(suffix, REFUND_CODE_LEN - REFUND_CODE_PREFIX.len()))
}
