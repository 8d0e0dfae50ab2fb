use crate::domain::ports::{
    RefundFilter, RefundRepository, TransactionFilter, TransactionRepository,
};
use crate::domain::refund::Refund;
use crate::domain::transaction::Transaction;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for storing transactions.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for storing refunds.
pub const CF_REFUNDS: &str = "refunds";
/// Column Family holding the unique index reference -> transaction id.
pub const CF_REFERENCES: &str = "references";

/// A persistent store implementation using RocksDB.
///
/// Transactions, refunds and the reference index live in separate Column Families.
/// A transaction row and its index entry are written in one batch.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    /// Serializes the check-then-write of the reference index.
    insert_guard: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_TRANSACTIONS, CF_REFUNDS, CF_REFERENCES]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            insert_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PaymentError::internal(format!("{name} column family not found")))
    }

    fn read<T: DeserializeOwned>(&self, name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(decode(&value)?);
        }
        Ok(rows)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|e| PaymentError::internal(format!("Serialization error: {e}")))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::internal(format!("Deserialization error: {e}")))
}

#[async_trait]
impl TransactionRepository for RocksDBStore {
    async fn insert(&self, tx: Transaction) -> Result<Transaction> {
        let _guard = self.insert_guard.lock().await;
        let rows = self.cf(CF_TRANSACTIONS)?;
        let references = self.cf(CF_REFERENCES)?;

        if self.db.get_pinned_cf(rows, tx.id.as_bytes())?.is_some() {
            return Err(PaymentError::ConflictError(format!(
                "transaction {} already exists",
                tx.id
            )));
        }
        if self
            .db
            .get_pinned_cf(references, tx.reference.as_bytes())?
            .is_some()
        {
            return Err(PaymentError::ConflictError(format!(
                "reference {} is already in use",
                tx.reference
            )));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(rows, tx.id.as_bytes(), encode(&tx)?);
        batch.put_cf(references, tx.reference.as_bytes(), tx.id.as_bytes());
        self.db.write(batch)?;
        Ok(tx)
    }

    async fn update(&self, tx: Transaction) -> Result<Transaction> {
        let stored: Transaction = self
            .read(CF_TRANSACTIONS, tx.id.as_bytes())?
            .ok_or_else(|| PaymentError::NotFoundError(format!("transaction {}", tx.id)))?;
        if stored.reference != tx.reference {
            return Err(PaymentError::ConflictError(format!(
                "reference of transaction {} cannot change",
                tx.id
            )));
        }
        let rows = self.cf(CF_TRANSACTIONS)?;
        self.db.put_cf(rows, tx.id.as_bytes(), encode(&tx)?)?;
        Ok(tx)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Transaction>> {
        self.read(CF_TRANSACTIONS, id.as_bytes())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Option<Transaction>> {
        let references = self.cf(CF_REFERENCES)?;
        let Some(id) = self.db.get_cf(references, reference.as_bytes())? else {
            return Ok(None);
        };
        self.read(CF_TRANSACTIONS, &id)
    }

    async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut found: Vec<Transaction> = self
            .scan::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|tx| filter.matches(tx))
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}

#[async_trait]
impl RefundRepository for RocksDBStore {
    async fn insert(&self, refund: Refund) -> Result<Refund> {
        let _guard = self.insert_guard.lock().await;
        let rows = self.cf(CF_REFUNDS)?;
        if self.db.get_pinned_cf(rows, refund.id.as_bytes())?.is_some() {
            return Err(PaymentError::ConflictError(format!(
                "refund {} already exists",
                refund.id
            )));
        }
        self.db.put_cf(rows, refund.id.as_bytes(), encode(&refund)?)?;
        Ok(refund)
    }

    async fn update(&self, refund: Refund) -> Result<Refund> {
        let rows = self.cf(CF_REFUNDS)?;
        if self.db.get_pinned_cf(rows, refund.id.as_bytes())?.is_none() {
            return Err(PaymentError::NotFoundError(format!("refund {}", refund.id)));
        }
        self.db.put_cf(rows, refund.id.as_bytes(), encode(&refund)?)?;
        Ok(refund)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Refund>> {
        self.read(CF_REFUNDS, id.as_bytes())
    }

    async fn list(&self, filter: &RefundFilter) -> Result<Vec<Refund>> {
        let mut found: Vec<Refund> = self
            .scan::<Refund>(CF_REFUNDS)?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        found.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(found)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let rows = self.cf(CF_REFUNDS)?;
        if self.db.get_pinned_cf(rows, id.as_bytes())?.is_none() {
            return Ok(false);
        }
        self.db.delete_cf(rows, id.as_bytes())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Currency};
    use crate::domain::payment::PaymentMethod;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn tx(reference: &str) -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Amount::new(dec!(100.0)).unwrap(),
            Currency::parse("BRL").unwrap(),
            PaymentMethod::InstantTransfer,
            reference.to_string(),
            None,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
        assert!(store.db.cf_handle(CF_REFUNDS).is_some());
        assert!(store.db.cf_handle(CF_REFERENCES).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_transaction_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let stored = TransactionRepository::insert(&store, tx("AAAAAAAAAAAAAAAA"))
            .await
            .unwrap();

        let by_id = TransactionRepository::find(&store, stored.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_id, stored);

        let by_ref = store
            .find_by_reference("AAAAAAAAAAAAAAAA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_ref, stored);

        let duplicate = TransactionRepository::insert(&store, tx("AAAAAAAAAAAAAAAA")).await;
        assert!(matches!(duplicate, Err(PaymentError::ConflictError(_))));
    }

    #[tokio::test]
    async fn test_rocksdb_refund_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let refund = Refund::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Amount::new(dec!(5.0)).unwrap(),
            "wrong game".to_string(),
            Utc::now(),
        );

        RefundRepository::insert(&store, refund.clone()).await.unwrap();
        let all = RefundRepository::list(&store, &RefundFilter::default())
            .await
            .unwrap();
        assert_eq!(all, vec![refund.clone()]);

        assert!(RefundRepository::delete(&store, refund.id).await.unwrap());
        assert!(
            RefundRepository::find(&store, refund.id)
                .await
                .unwrap()
                .is_none()
        );
    }
}
