use crate::domain::identifiers::{
    AUTHORIZATION_SUFFIX_LEN, REFERENCE_LEN, REFUND_CODE_LEN, REFUND_CODE_PREFIX,
    TRANSACTION_CODE_LEN,
};
use crate::domain::payment::PaymentMethod;
use crate::domain::ports::IdentifierMinter;
use uuid::Uuid;

/// Mints codes from the hex digits of random v4 uuids.
///
/// Uniqueness of references is not guaranteed here; the repository's unique index is the
/// authority and a collision surfaces as a conflict.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMinter;

impl RandomMinter {
    pub fn new() -> Self {
        Self
    }

    fn hex(len: usize) -> String {
        let mut out = String::with_capacity(len);
        while out.len() < len {
            let simple = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
            let take = (len - out.len()).min(simple.len());
            out.push_str(&simple[..take]);
        }
        out
    }
}

impl IdentifierMinter for RandomMinter {
    fn reference(&self) -> String {
        Self::hex(REFERENCE_LEN)
    }

    fn authorization_code(&self, method: PaymentMethod) -> String {
        format!("{}{}", method.code_prefix(), Self::hex(AUTHORIZATION_SUFFIX_LEN))
    }

    fn transaction_code(&self) -> String {
        Self::hex(TRANSACTION_CODE_LEN)
    }

    fn refund_code(&self) -> String {
        format!(
            "{REFUND_CODE_PREFIX}{}",
            Self::hex(REFUND_CODE_LEN - REFUND_CODE_PREFIX.len())
        )
    }
}
