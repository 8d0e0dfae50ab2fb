use super::money::Amount;
use super::payment::PaymentMethod;
use super::refund::{Refund, RefundStatus};
use super::transaction::{Transaction, TransactionStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PaymentPending,
    PaymentApproved,
    PaymentDeclined,
    PaymentFailed,
    PaymentCancelled,
    RefundRequested,
    RefundApproved,
    RefundDeclined,
}

/// A lifecycle change handed to the notification sink.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    pub transaction_id: Uuid,
    pub refund_id: Option<Uuid>,
    pub user_id: Uuid,
    pub amount: Amount,
    pub payment_method: Option<PaymentMethod>,
    pub occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Builds the event matching the transaction's current status, if that status is one
    /// the customer hears about.
    pub fn for_transaction(tx: &Transaction, occurred_at: DateTime<Utc>) -> Option<Self> {
        let kind = match tx.status {
            TransactionStatus::Pending | TransactionStatus::Processing => EventKind::PaymentPending,
            TransactionStatus::Approved => EventKind::PaymentApproved,
            TransactionStatus::Declined => EventKind::PaymentDeclined,
            TransactionStatus::Failed => EventKind::PaymentFailed,
            TransactionStatus::Cancelled => EventKind::PaymentCancelled,
            TransactionStatus::Refunded => return None,
        };
        Some(Self {
            kind,
            transaction_id: tx.id,
            refund_id: None,
            user_id: tx.user_id,
            amount: tx.amount,
            payment_method: Some(tx.payment_method),
            occurred_at,
        })
    }

    pub fn for_refund(refund: &Refund, occurred_at: DateTime<Utc>) -> Option<Self> {
        let kind = match refund.status {
            RefundStatus::Requested => EventKind::RefundRequested,
            RefundStatus::Approved => EventKind::RefundApproved,
            RefundStatus::Declined => EventKind::RefundDeclined,
            _ => return None,
        };
        Some(Self {
            kind,
            transaction_id: refund.transaction_id,
            refund_id: Some(refund.id),
            user_id: refund.user_id,
            amount: refund.refund_amount,
            payment_method: None,
            occurred_at,
        })
    }

    /// Customer-facing message text.
    pub fn content(&self) -> String {
        let via = self
            .payment_method
            .map(|m| format!(" via {m}"))
            .unwrap_or_default();
        let amount = self.amount;
        match self.kind {
            EventKind::PaymentPending => format!("Payment of {amount}{via} is being processed"),
            EventKind::PaymentApproved => format!("Payment of {amount}{via} was approved"),
            EventKind::PaymentDeclined => {
                format!("Payment of {amount}{via} was declined, please check your details")
            }
            EventKind::PaymentFailed => format!("Payment of {amount}{via} could not be processed"),
            EventKind::PaymentCancelled => format!("Payment of {amount}{via} was cancelled"),
            EventKind::RefundRequested => format!("Refund of {amount} was requested"),
            EventKind::RefundApproved => format!("Refund of {amount} was approved"),
            EventKind::RefundDeclined => format!("Refund of {amount} was declined"),
        }
    }
}
