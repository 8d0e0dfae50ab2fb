use crate::application::transactions::CreateTransactionRequest;
use crate::domain::payment::{
    BankSlipData, CardData, InstantTransferData, PaymentData, PaymentMethod,
};
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

/// One purchase row. Instrument columns that do not apply to the row's method are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRecord {
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub method: PaymentMethod,
    pub card_number: Option<String>,
    pub holder_name: Option<String>,
    pub expiry: Option<String>,
    pub cvv: Option<String>,
    pub installments: Option<u8>,
    pub pix_key: Option<String>,
    pub tax_id: Option<String>,
    pub payer_name: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub notes: Option<String>,
}

impl PurchaseRecord {
    fn payment_data(&self) -> PaymentData {
        if self.method.is_card() {
            return self.card_data();
        }
        match self.method {
            PaymentMethod::InstantTransfer => match &self.pix_key {
                Some(key) => PaymentData::with_instant_transfer(InstantTransferData {
                    key: key.clone(),
                }),
                None => PaymentData::default(),
            },
            PaymentMethod::BankSlip => self.bank_slip_data(),
            _ => PaymentData::default(),
        }
    }

    fn card_data(&self) -> PaymentData {
        let any = [&self.card_number, &self.holder_name, &self.expiry, &self.cvv]
            .iter()
            .any(|field| field.is_some())
            || self.installments.is_some();
        if !any {
            return PaymentData::default();
        }
        PaymentData::with_card(CardData {
            number: self.card_number.clone().unwrap_or_default(),
            holder_name: self.holder_name.clone().unwrap_or_default(),
            expiry: self.expiry.clone().unwrap_or_default(),
            cvv: self.cvv.clone().unwrap_or_default(),
            installments: self.installments,
        })
    }

    fn bank_slip_data(&self) -> PaymentData {
        let fields = [
            &self.tax_id,
            &self.payer_name,
            &self.address,
            &self.postal_code,
            &self.city,
            &self.state,
        ];
        if fields.iter().all(|field| field.is_none()) {
            return PaymentData::default();
        }
        PaymentData::with_bank_slip(BankSlipData {
            tax_id: self.tax_id.clone().unwrap_or_default(),
            payer_name: self.payer_name.clone().unwrap_or_default(),
            address: self.address.clone().unwrap_or_default(),
            postal_code: self.postal_code.clone().unwrap_or_default(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
        })
    }
}

impl From<PurchaseRecord> for CreateTransactionRequest {
    fn from(record: PurchaseRecord) -> Self {
        let payment_data = record.payment_data();
        CreateTransactionRequest {
            user_id: record.user_id,
            game_id: record.game_id,
            amount: record.amount,
            currency: record.currency,
            payment_method: record.method,
            payment_data,
            notes: record.notes,
        }
    }
}

/// Reads purchase requests from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths, so trailing
/// instrument columns may be left off.
pub struct PurchaseReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PurchaseReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes rows. A malformed row yields an error and reading continues.
    pub fn purchases(self) -> impl Iterator<Item = Result<CreateTransactionRequest>> {
        self.reader
            .into_deserialize::<PurchaseRecord>()
            .map(|result| {
                result
                    .map(CreateTransactionRequest::from)
                    .map_err(PaymentError::from)
            })
    }
}
