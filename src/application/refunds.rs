use super::EventPublisher;
use super::transactions::check_range;
use crate::domain::events::LifecycleEvent;
use crate::domain::money::Amount;
use crate::domain::ports::{
    GatewayOutcome, RefundFilter, RefundSettlement, SharedClock, SharedIdentifierMinter,
    SharedPaymentGateway, SharedRefundRepository, SharedTransactionRepository,
};
use crate::domain::refund::{Refund, RefundStatus};
use crate::domain::transaction::TransactionStatus;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundRequest {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
}

/// The guarded refund state machine. Reads the referenced transaction but never writes it.
pub struct RefundLifecycle {
    pub(crate) refunds: SharedRefundRepository,
    pub(crate) transactions: SharedTransactionRepository,
    pub(crate) gateway: SharedPaymentGateway,
    pub(crate) clock: SharedClock,
    pub(crate) minter: SharedIdentifierMinter,
    pub(crate) events: EventPublisher,
    pub(crate) enforce_ceiling: bool,
}

impl RefundLifecycle {
    /// Opens a refund against an `Approved` transaction.
    #[instrument(skip_all, fields(transaction_id = %request.transaction_id))]
    pub async fn request(&self, request: RefundRequest) -> Result<Refund> {
        let amount = Amount::new(request.amount)?;
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(PaymentError::ValidationError(
                "refund reason is required".to_string(),
            ));
        }

        let tx = self
            .transactions
            .find(request.transaction_id)
            .await?
            .filter(|tx| tx.active)
            .ok_or_else(|| {
                PaymentError::NotFoundError(format!("transaction {}", request.transaction_id))
            })?;
        if tx.status != TransactionStatus::Approved {
            return Err(PaymentError::InvalidStateError(format!(
                "only approved transactions can be refunded, transaction {} is {}",
                tx.id, tx.status
            )));
        }

        if self.enforce_ceiling {
            let committed: Decimal = self
                .by_transaction(tx.id)
                .await?
                .iter()
                .filter(|r| r.status.holds_funds())
                .map(|r| r.refund_amount.value())
                .sum();
            let remaining = tx.amount.value() - committed;
            if amount.value() > remaining {
                return Err(PaymentError::ValidationError(format!(
                    "refund of {amount} exceeds the refundable balance of {remaining:.2}"
                )));
            }
        }

        let refund = Refund::new(
            tx.id,
            request.user_id,
            amount,
            reason.to_string(),
            self.clock.now(),
        );
        let refund = self.refunds.insert(refund).await?;
        info!(refund_id = %refund.id, amount = %refund.refund_amount, "refund requested");
        self.events
            .publish(LifecycleEvent::for_refund(&refund, self.clock.now()))
            .await;
        Ok(refund)
    }

    /// Withdraws a refund that has not been processed yet.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> Result<Refund> {
        let mut refund = self.load(id).await?;
        require_requested(&refund, "cancelled")?;

        refund.decline(None, self.clock.now());
        let refund = self.refunds.update(refund).await?;
        info!(refund_id = %refund.id, "refund cancelled");
        self.events
            .publish(LifecycleEvent::for_refund(&refund, self.clock.now()))
            .await;
        Ok(refund)
    }

    /// Asks the gateway to settle a `Requested` refund. A gateway that cannot be reached
    /// leaves the refund untouched.
    #[instrument(skip(self))]
    pub async fn process(&self, id: Uuid) -> Result<Refund> {
        let mut refund = self.load(id).await?;
        require_requested(&refund, "processed")?;

        let outcome = self
            .gateway
            .refund(RefundSettlement {
                refund_id: refund.id,
                transaction_id: refund.transaction_id,
                amount: refund.refund_amount,
                reason: &refund.reason,
            })
            .await?;

        let now = self.clock.now();
        match outcome {
            GatewayOutcome::Approved => refund.approve(self.minter.refund_code(), now),
            GatewayOutcome::Declined {
                reason_code,
                message,
            } => refund.decline(Some(format!("{reason_code}: {message}")), now),
        }

        let refund = self.refunds.update(refund).await?;
        info!(refund_id = %refund.id, status = %refund.status, "refund processed");
        self.events
            .publish(LifecycleEvent::for_refund(&refund, self.clock.now()))
            .await;
        Ok(refund)
    }

    pub async fn get(&self, id: Uuid) -> Result<Refund> {
        self.load(id).await
    }

    pub async fn search(&self, filter: &RefundFilter) -> Result<Vec<Refund>> {
        if let (Some(from), Some(to)) = (filter.requested_from, filter.requested_to) {
            check_range(from, to)?;
        }
        self.refunds.list(filter).await
    }

    pub async fn list_all(&self) -> Result<Vec<Refund>> {
        self.search(&RefundFilter::default()).await
    }

    pub async fn by_user(&self, user_id: Uuid) -> Result<Vec<Refund>> {
        self.search(&RefundFilter {
            user_id: Some(user_id),
            ..Default::default()
        })
        .await
    }

    pub async fn by_transaction(&self, transaction_id: Uuid) -> Result<Vec<Refund>> {
        self.search(&RefundFilter {
            transaction_id: Some(transaction_id),
            ..Default::default()
        })
        .await
    }

    pub async fn by_status(&self, status: RefundStatus) -> Result<Vec<Refund>> {
        self.search(&RefundFilter {
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    pub async fn requested_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Refund>> {
        self.search(&RefundFilter {
            requested_from: Some(from),
            requested_to: Some(to),
            ..Default::default()
        })
        .await
    }

    async fn load(&self, id: Uuid) -> Result<Refund> {
        self.refunds
            .find(id)
            .await?
            .ok_or_else(|| PaymentError::NotFoundError(format!("refund {id}")))
    }
}

fn require_requested(refund: &Refund, action: &str) -> Result<()> {
    if refund.status == RefundStatus::Requested {
        Ok(())
    } else {
        Err(PaymentError::InvalidStateError(format!(
            "only requested refunds can be {action}, refund {} is {}",
            refund.id, refund.status
        )))
    }
}
