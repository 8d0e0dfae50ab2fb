use super::EventPublisher;
use crate::config::SettlementMode;
use crate::domain::events::LifecycleEvent;
use crate::domain::money::{Amount, Currency};
use crate::domain::payment::{PaymentData, PaymentMethod};
use crate::domain::ports::{
    AuthorizationRequest, GatewayOutcome, SharedClock, SharedIdentifierMinter,
    SharedPaymentGateway, SharedTransactionRepository, TransactionFilter,
};
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::domain::validation::PaymentMethodValidator;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A purchase as it arrives from the outer layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: Decimal,
    /// Falls back to the configured default currency.
    pub currency: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_data: PaymentData,
    pub notes: Option<String>,
}

/// The guarded transaction state machine.
///
/// `Pending -> Processing -> {Approved, Declined}`, `Approved -> Cancelled`, and
/// `Failed` whenever the gateway cannot be reached.
pub struct TransactionLifecycle {
    pub(crate) repository: SharedTransactionRepository,
    pub(crate) gateway: SharedPaymentGateway,
    pub(crate) clock: SharedClock,
    pub(crate) minter: SharedIdentifierMinter,
    pub(crate) events: EventPublisher,
    pub(crate) default_currency: Currency,
    pub(crate) retry_backoff: Duration,
}

impl TransactionLifecycle {
    /// Validates and persists a new transaction.
    ///
    /// In `Immediate` mode the row is stored as `Processing` before the gateway is called,
    /// so a reference collision fails without charging and an approved charge is always
    /// recorded. The returned transaction is then `Approved`, `Declined` or `Failed`.
    /// In `Deferred` mode it is stored as `Pending`.
    #[instrument(skip_all, fields(user_id = %request.user_id, method = ?request.payment_method))]
    pub async fn create(
        &self,
        request: CreateTransactionRequest,
        mode: SettlementMode,
    ) -> Result<Transaction> {
        let amount = Amount::new(request.amount)?;
        let currency = match request.currency.as_deref() {
            Some(code) => Currency::parse(code)?,
            None => self.default_currency.clone(),
        };
        PaymentMethodValidator::validate(request.payment_method, &request.payment_data)?;

        let now = self.clock.now();
        let mut tx = Transaction::new(
            request.user_id,
            request.game_id,
            amount,
            currency,
            request.payment_method,
            self.minter.reference(),
            request.notes,
            now,
        );

        if mode == SettlementMode::Immediate {
            tx.begin_processing(now);
        }
        let mut tx = self.repository.insert(tx).await.inspect_err(|e| {
            warn!(error = %e, "transaction could not be stored");
        })?;

        if mode == SettlementMode::Immediate {
            let id = tx.id;
            self.settle(&mut tx, Some(&request.payment_data)).await;
            tx = self.repository.update(tx).await.inspect_err(|e| {
                warn!(transaction_id = %id, error = %e, "settlement could not be stored");
            })?;
        }
        info!(
            transaction_id = %tx.id,
            reference = %tx.reference,
            status = %tx.status,
            "transaction created"
        );
        self.events
            .publish(LifecycleEvent::for_transaction(&tx, self.clock.now()))
            .await;
        Ok(tx)
    }

    /// Runs an authorization attempt for a `Pending` transaction.
    #[instrument(skip(self))]
    pub async fn authorize(&self, id: Uuid) -> Result<Transaction> {
        let mut tx = self.load(id).await?;
        if tx.status != TransactionStatus::Pending {
            return Err(PaymentError::InvalidStateError(if tx.status.is_terminal() {
                format!(
                    "transaction {id} is {} and can only change through an administrative update",
                    tx.status
                )
            } else {
                format!(
                    "transaction {id} must be pending to authorize, it is {}",
                    tx.status
                )
            }));
        }

        tx.begin_processing(self.clock.now());
        self.settle(&mut tx, None).await;

        let tx = self.repository.update(tx).await?;
        info!(
            transaction_id = %tx.id,
            status = %tx.status,
            attempt = tx.attempt_count,
            "authorization attempt finished"
        );
        self.events
            .publish(LifecycleEvent::for_transaction(&tx, self.clock.now()))
            .await;
        Ok(tx)
    }

    /// Cancels a transaction in any state other than `Cancelled`, including `Approved`.
    /// No refund is implied.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: Uuid) -> Result<Transaction> {
        let mut tx = self.load(id).await?;
        if tx.status == TransactionStatus::Cancelled {
            return Err(PaymentError::InvalidStateError(format!(
                "transaction {id} is already cancelled"
            )));
        }
        let previous = tx.status;
        tx.cancel(self.clock.now());

        let tx = self.repository.update(tx).await?;
        info!(transaction_id = %tx.id, from = %previous, "transaction cancelled");
        self.events
            .publish(LifecycleEvent::for_transaction(&tx, self.clock.now()))
            .await;
        Ok(tx)
    }

    pub async fn get(&self, id: Uuid) -> Result<Transaction> {
        self.load(id).await
    }

    pub async fn get_by_reference(&self, reference: &str) -> Result<Transaction> {
        self.repository
            .find_by_reference(reference)
            .await?
            .filter(|tx| tx.active)
            .ok_or_else(|| {
                PaymentError::NotFoundError(format!("transaction with reference {reference}"))
            })
    }

    pub async fn search(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        if let (Some(from), Some(to)) = (filter.created_from, filter.created_to) {
            check_range(from, to)?;
        }
        self.repository.list(filter).await
    }

    pub async fn list_all(&self) -> Result<Vec<Transaction>> {
        self.search(&TransactionFilter::default()).await
    }

    pub async fn by_user(&self, user_id: Uuid) -> Result<Vec<Transaction>> {
        self.search(&TransactionFilter {
            user_id: Some(user_id),
            ..Default::default()
        })
        .await
    }

    pub async fn by_game(&self, game_id: Uuid) -> Result<Vec<Transaction>> {
        self.search(&TransactionFilter {
            game_id: Some(game_id),
            ..Default::default()
        })
        .await
    }

    pub async fn by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        self.search(&TransactionFilter {
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    pub async fn by_payment_method(&self, method: PaymentMethod) -> Result<Vec<Transaction>> {
        self.search(&TransactionFilter {
            payment_method: Some(method),
            ..Default::default()
        })
        .await
    }

    /// Transactions created within `[from, to]`.
    pub async fn created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        self.search(&TransactionFilter {
            created_from: Some(from),
            created_to: Some(to),
            ..Default::default()
        })
        .await
    }

    async fn load(&self, id: Uuid) -> Result<Transaction> {
        self.repository
            .find(id)
            .await?
            .filter(|tx| tx.active)
            .ok_or_else(|| PaymentError::NotFoundError(format!("transaction {id}")))
    }

    /// Asks the gateway for a decision and records it on `tx`, which must be `Processing`.
    async fn settle(&self, tx: &mut Transaction, instrument: Option<&PaymentData>) {
        let request = AuthorizationRequest {
            reference: &tx.reference,
            payment_method: tx.payment_method,
            amount: tx.amount,
            instrument,
        };
        let outcome = self.gateway.authorize(request).await;
        let now = self.clock.now();

        match outcome {
            Ok(GatewayOutcome::Approved) => {
                let authorization_code = self.minter.authorization_code(tx.payment_method);
                tx.approve(authorization_code, self.minter.transaction_code(), now);
                if tx.notes.is_none()
                    && let Some(data) = instrument
                {
                    tx.notes = Some(data.summary(tx.payment_method));
                }
            }
            Ok(GatewayOutcome::Declined {
                reason_code,
                message,
            }) => {
                tx.decline(
                    format!("{reason_code}: {message}"),
                    self.next_attempt(now),
                    now,
                );
            }
            Err(e) => {
                warn!(
                    reference = %tx.reference,
                    error = %e,
                    "gateway unavailable, marking transaction failed"
                );
                tx.fail(
                    format!("gateway unavailable: {e}"),
                    self.next_attempt(now),
                    now,
                );
            }
        }
    }

    fn next_attempt(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.retry_backoff).unwrap_or(now)
    }
}

pub(crate) fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
    if from > to {
        Err(PaymentError::ValidationError(format!(
            "range start {from} is after its end {to}"
        )))
    } else {
        Ok(())
    }
}
