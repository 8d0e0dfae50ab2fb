use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CardCredit,
    CardDebit,
    InstantTransfer,
    BankSlip,
    WireTransfer,
    DigitalWallet,
}

impl PaymentMethod {
    /// Prefix carried by authorization codes issued for this method.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Self::CardCredit => "CC",
            Self::CardDebit => "CD",
            Self::InstantTransfer => "PIX",
            Self::BankSlip => "BOL",
            Self::WireTransfer => "WT",
            Self::DigitalWallet => "DW",
        }
    }

    pub fn is_card(&self) -> bool {
        matches!(self, Self::CardCredit | Self::CardDebit)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CardCredit => "credit card",
            Self::CardDebit => "debit card",
            Self::InstantTransfer => "instant transfer",
            Self::BankSlip => "bank slip",
            Self::WireTransfer => "wire transfer",
            Self::DigitalWallet => "digital wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub number: String,
    pub holder_name: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvv: String,
    pub installments: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstantTransferData {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankSlipData {
    pub tax_id: String,
    pub payer_name: String,
    pub address: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
}

/// Instrument data supplied with a purchase. Only the section matching the payment method
/// is looked at; it is validated and handed to the gateway but never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentData {
    pub card: Option<CardData>,
    pub instant_transfer: Option<InstantTransferData>,
    pub bank_slip: Option<BankSlipData>,
}

impl PaymentData {
    pub fn with_card(card: CardData) -> Self {
        Self {
            card: Some(card),
            ..Self::default()
        }
    }

    pub fn with_instant_transfer(data: InstantTransferData) -> Self {
        Self {
            instant_transfer: Some(data),
            ..Self::default()
        }
    }

    pub fn with_bank_slip(data: BankSlipData) -> Self {
        Self {
            bank_slip: Some(data),
            ..Self::default()
        }
    }

    /// Human readable note recorded on approved transactions. Never exposes full card
    /// numbers or tax ids.
    pub fn summary(&self, method: PaymentMethod) -> String {
        match method {
            PaymentMethod::CardCredit => {
                let installments = self
                    .card
                    .as_ref()
                    .and_then(|c| c.installments)
                    .unwrap_or(1);
                format!(
                    "Credit card {} - installments: {installments}",
                    self.masked_card()
                )
            }
            PaymentMethod::CardDebit => format!("Debit card {} processed", self.masked_card()),
            PaymentMethod::InstantTransfer => "Instant transfer processed".to_string(),
            PaymentMethod::BankSlip => {
                let payer = self
                    .bank_slip
                    .as_ref()
                    .map(|b| b.payer_name.as_str())
                    .unwrap_or_default();
                format!("Bank slip issued to {payer}")
            }
            other => format!("Payment processed via {other}"),
        }
    }

    fn masked_card(&self) -> String {
        let digits: String = self
            .card
            .as_ref()
            .map(|c| c.number.chars().filter(char::is_ascii_digit).collect())
            .unwrap_or_default();
        let tail = &digits[digits.len().saturating_sub(4)..];
        format!("****{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_two_or_three_letters() {
        for method in [
            PaymentMethod::CardCredit,
            PaymentMethod::CardDebit,
            PaymentMethod::InstantTransfer,
            PaymentMethod::BankSlip,
            PaymentMethod::WireTransfer,
            PaymentMethod::DigitalWallet,
        ] {
            let prefix = method.code_prefix();
            assert!((2..=3).contains(&prefix.len()));
            assert!(prefix.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_summary_masks_card_number() {
        let data = PaymentData::with_card(CardData {
            number: "4111 1111 1111 1234".to_string(),
            holder_name: "Ana".to_string(),
            expiry: "12/30".to_string(),
            cvv: "123".to_string(),
            installments: Some(3),
        });

        let summary = data.summary(PaymentMethod::CardCredit);
        assert_eq!(summary, "Credit card ****1234 - installments: 3");
        assert!(!summary.contains("4111"));
    }

    #[test]
    fn test_method_deserializes_snake_case() {
        let method: PaymentMethod = serde_json::from_str("\"instant_transfer\"").unwrap();
        assert_eq!(method, PaymentMethod::InstantTransfer);
    }
}
