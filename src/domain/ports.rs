use super::events::LifecycleEvent;
use super::money::Amount;
use super::payment::{PaymentData, PaymentMethod};
use super::refund::{Refund, RefundStatus};
use super::transaction::{Transaction, TransactionStatus};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Criteria for listing transactions. Empty criteria match every active transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub user_id: Option<Uuid>,
    pub game_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        tx.active
            && self.user_id.is_none_or(|id| tx.user_id == id)
            && self.game_id.is_none_or(|id| tx.game_id == id)
            && self.status.is_none_or(|s| tx.status == s)
            && self.payment_method.is_none_or(|m| tx.payment_method == m)
            && self.created_from.is_none_or(|from| tx.created_at >= from)
            && self.created_to.is_none_or(|to| tx.created_at <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefundFilter {
    pub user_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
    pub status: Option<RefundStatus>,
    pub requested_from: Option<DateTime<Utc>>,
    pub requested_to: Option<DateTime<Utc>>,
}

impl RefundFilter {
    pub fn matches(&self, refund: &Refund) -> bool {
        self.user_id.is_none_or(|id| refund.user_id == id)
            && self.transaction_id.is_none_or(|id| refund.transaction_id == id)
            && self.status.is_none_or(|s| refund.status == s)
            && self.requested_from.is_none_or(|from| refund.requested_at >= from)
            && self.requested_to.is_none_or(|to| refund.requested_at <= to)
    }
}

/// Persistence for transactions.
///
/// Implementations own the unique index on `reference`: `insert` must fail with
/// `ConflictError` when the id or reference is already taken, and `update` must refuse
/// to change a stored reference. `list` returns matches newest first.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn insert(&self, tx: Transaction) -> Result<Transaction>;
    async fn update(&self, tx: Transaction) -> Result<Transaction>;
    async fn find(&self, id: Uuid) -> Result<Option<Transaction>>;
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>>;
    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait RefundRepository: Send + Sync {
    async fn insert(&self, refund: Refund) -> Result<Refund>;
    async fn update(&self, refund: Refund) -> Result<Refund>;
    async fn find(&self, id: Uuid) -> Result<Option<Refund>>;
    async fn list(&self, filter: &RefundFilter) -> Result<Vec<Refund>>;
    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// What the gateway is asked to authorize. `instrument` is only present when the caller
/// still holds the instrument data (immediate settlement); it is never persisted.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    pub reference: &'a str,
    pub payment_method: PaymentMethod,
    pub amount: Amount,
    pub instrument: Option<&'a PaymentData>,
}

#[derive(Debug, Clone, Copy)]
pub struct RefundSettlement<'a> {
    pub refund_id: Uuid,
    pub transaction_id: Uuid,
    pub amount: Amount,
    pub reason: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Approved,
    Declined { reason_code: String, message: String },
}

impl GatewayOutcome {
    pub fn declined(reason_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Declined {
            reason_code: reason_code.into(),
            message: message.into(),
        }
    }
}

/// Decides payment and refund outcomes. An `Err` means the gateway could not be reached
/// or answered nonsense, not that the payment was declined.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, request: AuthorizationRequest<'_>) -> Result<GatewayOutcome>;
    async fn refund(&self, settlement: RefundSettlement<'_>) -> Result<GatewayOutcome>;
}

/// Fire-and-forget delivery of lifecycle events. Errors are logged by the caller and
/// never fail the operation that raised the event.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: LifecycleEvent) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub trait IdentifierMinter: Send + Sync {
    /// 16 uppercase alphanumeric characters.
    fn reference(&self) -> String;
    /// Method prefix followed by 6 uppercase alphanumeric characters.
    fn authorization_code(&self, method: PaymentMethod) -> String;
    /// 12 uppercase alphanumeric characters.
    fn transaction_code(&self) -> String;
    fn refund_code(&self) -> String;
}

pub type SharedTransactionRepository = Arc<dyn TransactionRepository>;
pub type SharedRefundRepository = Arc<dyn RefundRepository>;
pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;
pub type SharedNotificationSink = Arc<dyn NotificationSink>;
pub type SharedClock = Arc<dyn Clock>;
pub type SharedIdentifierMinter = Arc<dyn IdentifierMinter>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn tx_at(created_at: DateTime<Utc>) -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Amount::new(dec!(10)).unwrap(),
            Currency::parse("BRL").unwrap(),
            PaymentMethod::BankSlip,
            "0123456789ABCDEF".to_string(),
            None,
            created_at,
        )
    }

    #[test]
    fn test_empty_filter_matches_active_only() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut tx = tx_at(at);
        assert!(TransactionFilter::default().matches(&tx));

        tx.deactivate(at);
        assert!(!TransactionFilter::default().matches(&tx));
    }

    #[test]
    fn test_created_range_is_inclusive() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let tx = tx_at(at);
        let filter = TransactionFilter {
            created_from: Some(at),
            created_to: Some(at),
            ..Default::default()
        };
        assert!(filter.matches(&tx));

        let later = TransactionFilter {
            created_from: Some(at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&tx));
    }

    #[test]
    fn test_filter_combines_criteria() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let tx = tx_at(at);
        let filter = TransactionFilter {
            user_id: Some(tx.user_id),
            payment_method: Some(PaymentMethod::CardDebit),
            ..Default::default()
        };
        assert!(!filter.matches(&tx));
    }
}
