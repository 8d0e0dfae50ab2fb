use crate::domain::ports::{
    RefundFilter, RefundRepository, TransactionFilter, TransactionRepository,
};
use crate::domain::refund::Refund;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct TransactionTable {
    rows: HashMap<Uuid, Transaction>,
    /// Unique index: reference -> id.
    references: HashMap<String, Uuid>,
}

/// A thread-safe in-memory store for transactions.
///
/// Keeps a reference index next to the rows so uniqueness is checked under the same
/// write lock as the insert.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    table: Arc<RwLock<TransactionTable>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<Transaction> {
        let mut table = self.table.write().await;
        if table.rows.contains_key(&tx.id) {
            return Err(PaymentError::ConflictError(format!(
                "transaction {} already exists",
                tx.id
            )));
        }
        if table.references.contains_key(&tx.reference) {
            return Err(PaymentError::ConflictError(format!(
                "reference {} is already in use",
                tx.reference
            )));
        }
        table.references.insert(tx.reference.clone(), tx.id);
        table.rows.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn update(&self, tx: Transaction) -> Result<Transaction> {
        let mut table = self.table.write().await;
        let stored = table
            .rows
            .get_mut(&tx.id)
            .ok_or_else(|| PaymentError::NotFoundError(format!("transaction {}", tx.id)))?;
        if stored.reference != tx.reference {
            return Err(PaymentError::ConflictError(format!(
                "reference of transaction {} cannot change",
                tx.id
            )));
        }
        *stored = tx.clone();
        Ok(tx)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Transaction>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        let table = self.table.read().await;
        Ok(table
            .references
            .get(reference)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let table = self.table.read().await;
        let mut found: Vec<Transaction> = table
            .rows
            .values()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

/// A thread-safe in-memory store for refunds.
#[derive(Default, Clone)]
pub struct InMemoryRefundStore {
    refunds: Arc<RwLock<HashMap<Uuid, Refund>>>,
}

impl InMemoryRefundStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefundRepository for InMemoryRefundStore {
    async fn insert(&self, refund: Refund) -> Result<Refund> {
        let mut refunds = self.refunds.write().await;
        if refunds.contains_key(&refund.id) {
            return Err(PaymentError::ConflictError(format!(
                "refund {} already exists",
                refund.id
            )));
        }
        refunds.insert(refund.id, refund.clone());
        Ok(refund)
    }

    async fn update(&self, refund: Refund) -> Result<Refund> {
        let mut refunds = self.refunds.write().await;
        let stored = refunds
            .get_mut(&refund.id)
            .ok_or_else(|| PaymentError::NotFoundError(format!("refund {}", refund.id)))?;
        *stored = refund.clone();
        Ok(refund)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Refund>> {
        let refunds = self.refunds.read().await;
        Ok(refunds.get(&id).cloned())
    }

    async fn list(&self, filter: &RefundFilter) -> Result<Vec<Refund>> {
        let refunds = self.refunds.read().await;
        let mut found: Vec<Refund> = refunds
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut refunds = self.refunds.write().await;
        Ok(refunds.remove(&id).is_some())
    }
}
