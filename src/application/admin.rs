use crate::domain::ports::{SharedClock, SharedRefundRepository, SharedTransactionRepository};
use crate::domain::refund::{Refund, RefundStatus};
use crate::domain::transaction::{Transaction, TransactionPatch};
use crate::error::{PaymentError, Result};
use tracing::{info, instrument};
use uuid::Uuid;

/// Operator tooling that bypasses the lifecycle guards.
///
/// Nothing here consults the gateway or emits lifecycle events. Identity fields
/// (`id`, `reference`, `user_id`, `game_id`, `amount`, `payment_method`, `created_at`)
/// can never be overwritten.
pub struct AdministrativeOverride {
    pub(crate) transactions: SharedTransactionRepository,
    pub(crate) refunds: SharedRefundRepository,
    pub(crate) clock: SharedClock,
}

impl AdministrativeOverride {
    #[instrument(skip(self, patch))]
    pub async fn update_transaction(
        &self,
        id: Uuid,
        patch: TransactionPatch,
    ) -> Result<Transaction> {
        if patch.is_empty() {
            return Err(PaymentError::ValidationError(
                "transaction update carries no changes".to_string(),
            ));
        }
        let mut tx = self.load_transaction(id).await?;
        let previous = tx.status;
        tx.apply_patch(patch, self.clock.now());

        let tx = self.transactions.update(tx).await?;
        info!(transaction_id = %tx.id, from = %previous, to = %tx.status, "transaction overridden");
        Ok(tx)
    }

    /// Sets a refund's status directly, from any state.
    #[instrument(skip(self))]
    pub async fn set_refund_status(&self, id: Uuid, status: RefundStatus) -> Result<Refund> {
        let mut refund = self
            .refunds
            .find(id)
            .await?
            .ok_or_else(|| PaymentError::NotFoundError(format!("refund {id}")))?;
        let previous = refund.status;
        refund.force_status(status, self.clock.now());

        let refund = self.refunds.update(refund).await?;
        info!(refund_id = %refund.id, from = %previous, to = %refund.status, "refund overridden");
        Ok(refund)
    }

    /// Soft delete: the row stays in storage but disappears from every read.
    #[instrument(skip(self))]
    pub async fn delete_transaction(&self, id: Uuid) -> Result<()> {
        let mut tx = self.load_transaction(id).await?;
        tx.deactivate(self.clock.now());
        self.transactions.update(tx).await?;
        info!(transaction_id = %id, "transaction deactivated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_refund(&self, id: Uuid) -> Result<()> {
        if !self.refunds.delete(id).await? {
            return Err(PaymentError::NotFoundError(format!("refund {id}")));
        }
        info!(refund_id = %id, "refund deleted");
        Ok(())
    }

    async fn load_transaction(&self, id: Uuid) -> Result<Transaction> {
        self.transactions
            .find(id)
            .await?
            .filter(|tx| tx.active)
            .ok_or_else(|| PaymentError::NotFoundError(format!("transaction {id}")))
    }
}
