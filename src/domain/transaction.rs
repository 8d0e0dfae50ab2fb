use super::money::{Amount, Currency};
use super::payment::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Approved,
    Declined,
    Cancelled,
    Refunded,
    Failed,
}

impl TransactionStatus {
    /// Terminal states are never advanced by the guarded lifecycle; only an
    /// administrative patch moves a transaction out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Declined | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A purchase payment and its settlement state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: Amount,
    pub currency: Currency,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    /// Unique lookup key, minted once at creation.
    pub reference: String,
    pub authorization_code: Option<String>,
    pub transaction_code: Option<String>,
    pub attempt_count: u32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub error_detail: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields an administrator may overwrite without going through the state machine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub status: Option<TransactionStatus>,
    pub notes: Option<String>,
    pub error_detail: Option<String>,
    pub attempt_count: Option<u32>,
    pub next_attempt_at: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        game_id: Uuid,
        amount: Amount,
        currency: Currency,
        payment_method: PaymentMethod,
        reference: String,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            game_id,
            amount,
            currency,
            payment_method,
            status: TransactionStatus::Pending,
            reference,
            authorization_code: None,
            transaction_code: None,
            attempt_count: 0,
            next_attempt_at: None,
            error_detail: None,
            notes,
            active: true,
            created_at: now,
            processed_at: None,
            confirmed_at: None,
            updated_at: None,
        }
    }

    /// Starts an authorization attempt.
    pub fn begin_processing(&mut self, now: DateTime<Utc>) {
        self.status = TransactionStatus::Processing;
        self.attempt_count += 1;
        self.processed_at = Some(now);
        self.updated_at = Some(now);
    }

    pub fn approve(
        &mut self,
        authorization_code: String,
        transaction_code: String,
        now: DateTime<Utc>,
    ) {
        self.status = TransactionStatus::Approved;
        self.authorization_code = Some(authorization_code);
        self.transaction_code = Some(transaction_code);
        self.confirmed_at = Some(now);
        self.error_detail = None;
        self.next_attempt_at = None;
        self.updated_at = Some(now);
    }

    pub fn decline(&mut self, detail: String, next_attempt_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.status = TransactionStatus::Declined;
        self.error_detail = Some(detail);
        self.next_attempt_at = Some(next_attempt_at);
        self.updated_at = Some(now);
    }

    pub fn fail(&mut self, detail: String, next_attempt_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.status = TransactionStatus::Failed;
        self.error_detail = Some(detail);
        self.next_attempt_at = Some(next_attempt_at);
        self.updated_at = Some(now);
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = TransactionStatus::Cancelled;
        self.next_attempt_at = None;
        self.updated_at = Some(now);
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.updated_at = Some(now);
    }

    /// Overwrites whatever the patch carries. No transition legality is checked.
    pub fn apply_patch(&mut self, patch: TransactionPatch, now: DateTime<Utc>) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(detail) = patch.error_detail {
            self.error_detail = Some(detail);
        }
        if let Some(attempts) = patch.attempt_count {
            self.attempt_count = attempts;
        }
        if let Some(next) = patch.next_attempt_at {
            self.next_attempt_at = Some(next);
        }
        self.updated_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 7, 12, 0, 0).unwrap()
    }

    fn pending() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Amount::new(dec!(59.90)).unwrap(),
            Currency::parse("BRL").unwrap(),
            PaymentMethod::CardCredit,
            "0123456789ABCDEF".to_string(),
            None,
            now(),
        )
    }

    #[test]
    fn test_new_transaction_is_pending_and_active() {
        let tx = pending();
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.attempt_count, 0);
        assert!(tx.active);
        assert!(tx.updated_at.is_none());
    }

    #[test]
    fn test_attempt_then_approve() {
        let mut tx = pending();
        tx.begin_processing(now());
        assert_eq!(tx.status, TransactionStatus::Processing);
        assert_eq!(tx.attempt_count, 1);

        tx.approve("CCABC123".into(), "ABCDEF123456".into(), now());
        assert_eq!(tx.status, TransactionStatus::Approved);
        assert_eq!(tx.confirmed_at, Some(now()));
        assert!(tx.next_attempt_at.is_none());
    }

    #[test]
    fn test_decline_schedules_next_attempt() {
        let mut tx = pending();
        tx.begin_processing(now());
        let retry = now() + Duration::minutes(5);
        tx.decline("card_declined: limit".into(), retry, now());
        assert_eq!(tx.status, TransactionStatus::Declined);
        assert_eq!(tx.next_attempt_at, Some(retry));
        assert!(tx.status.is_terminal());
        assert!(tx.authorization_code.is_none());
    }

    #[test]
    fn test_patch_overrides_without_guards() {
        let mut tx = pending();
        tx.cancel(now());
        tx.apply_patch(
            TransactionPatch {
                status: Some(TransactionStatus::Refunded),
                attempt_count: Some(7),
                ..Default::default()
            },
            now(),
        );
        assert_eq!(tx.status, TransactionStatus::Refunded);
        assert_eq!(tx.attempt_count, 7);
        assert!(tx.notes.is_none());
    }

    #[test]
    fn test_serde_round_trip_preserves_entity() {
        let mut tx = pending();
        tx.begin_processing(now());
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }
}
