//! Structural checks on payment instrument data, run before any authorization attempt.

use super::payment::{BankSlipData, CardData, InstantTransferData, PaymentData, PaymentMethod};
use crate::error::{PaymentError, Result};

/// Validates the instrument section required by a payment method.
///
/// Stops at the first violation and names the offending field in the error.
pub struct PaymentMethodValidator;

impl PaymentMethodValidator {
    pub fn validate(method: PaymentMethod, data: &PaymentData) -> Result<()> {
        match method {
            PaymentMethod::CardCredit | PaymentMethod::CardDebit => {
                let card = data
                    .card
                    .as_ref()
                    .ok_or_else(|| invalid("card data is required for card payments"))?;
                Self::validate_card(card)
            }
            PaymentMethod::InstantTransfer => {
                let transfer = data.instant_transfer.as_ref().ok_or_else(|| {
                    invalid("instant transfer data is required for instant transfer payments")
                })?;
                Self::validate_instant_transfer(transfer)
            }
            PaymentMethod::BankSlip => {
                let slip = data
                    .bank_slip
                    .as_ref()
                    .ok_or_else(|| invalid("bank slip data is required for bank slip payments"))?;
                Self::validate_bank_slip(slip)
            }
            PaymentMethod::WireTransfer | PaymentMethod::DigitalWallet => Ok(()),
        }
    }

    fn validate_card(card: &CardData) -> Result<()> {
        require("card number", &card.number)?;
        require("card holder name", &card.holder_name)?;
        require("card expiry", &card.expiry)?;
        if !is_expiry(card.expiry.trim()) {
            return Err(invalid("card expiry must be in MM/YY format"));
        }
        require("card cvv", &card.cvv)?;
        let cvv = card.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("card cvv must be 3 or 4 digits"));
        }
        if let Some(installments) = card.installments
            && !(1..=12).contains(&installments)
        {
            return Err(invalid("card installments must be between 1 and 12"));
        }
        Ok(())
    }

    fn validate_instant_transfer(transfer: &InstantTransferData) -> Result<()> {
        require("instant transfer key", &transfer.key)
    }

    fn validate_bank_slip(slip: &BankSlipData) -> Result<()> {
        require("payer tax id", &slip.tax_id)?;
        require("payer name", &slip.payer_name)?;
        require("payer address", &slip.address)?;
        require("postal code", &slip.postal_code)?;
        if !is_postal_code(slip.postal_code.trim()) {
            return Err(invalid("postal code must match NNNNN-NNN or NNNNNNNN"));
        }
        require("city", &slip.city)?;
        require("state", &slip.state)?;
        let state = slip.state.trim();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("state must be a 2-letter code"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> PaymentError {
    PaymentError::ValidationError(message.to_string())
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(PaymentError::ValidationError(format!("{field} is required")))
    } else {
        Ok(())
    }
}

fn is_expiry(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b'/' {
        return false;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return false;
    }
    let month = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    (1..=12).contains(&month)
}

fn is_postal_code(value: &str) -> bool {
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    match value.split_once('-') {
        Some((head, tail)) => {
            head.len() == 5 && tail.len() == 3 && all_digits(head) && all_digits(tail)
        }
        None => value.len() == 8 && all_digits(value),
    }
}
