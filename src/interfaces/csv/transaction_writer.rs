use crate::domain::payment::PaymentMethod;
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

/// Flat report row for a transaction. Amounts are written with two decimal places.
#[derive(Debug, Serialize)]
pub struct TransactionRow<'a> {
    pub id: Uuid,
    pub reference: &'a str,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: String,
    pub currency: &'a str,
    pub method: PaymentMethod,
    pub status: TransactionStatus,
    pub authorization_code: Option<&'a str>,
    pub transaction_code: Option<&'a str>,
    pub attempt_count: u32,
    pub error_detail: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            id: tx.id,
            reference: &tx.reference,
            user_id: tx.user_id,
            game_id: tx.game_id,
            amount: tx.amount.to_string(),
            currency: tx.currency.code(),
            method: tx.payment_method,
            status: tx.status,
            authorization_code: tx.authorization_code.as_deref(),
            transaction_code: tx.transaction_code.as_deref(),
            attempt_count: tx.attempt_count,
            error_detail: tx.error_detail.as_deref(),
            created_at: tx.created_at,
        }
    }
}

/// Writes transactions as CSV to any `Write` sink (stdout for the CLI).
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes a header followed by one row per transaction, then flushes.
    pub fn write_transactions<'a>(
        &mut self,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(TransactionRow::from(tx))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
