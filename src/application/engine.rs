use super::EventPublisher;
use super::admin::AdministrativeOverride;
use super::refunds::RefundLifecycle;
use super::transactions::{CreateTransactionRequest, TransactionLifecycle};
use crate::config::EngineConfig;
use crate::domain::ports::{
    SharedClock, SharedIdentifierMinter, SharedNotificationSink, SharedPaymentGateway,
    SharedRefundRepository, SharedTransactionRepository,
};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::minter::RandomMinter;
use crate::infrastructure::notifier::LoggingNotifier;
use std::sync::Arc;

/// Everything the engine talks to. Supplied once at construction.
#[derive(Clone)]
pub struct Collaborators {
    pub transactions: SharedTransactionRepository,
    pub refunds: SharedRefundRepository,
    pub gateway: SharedPaymentGateway,
    pub notifier: SharedNotificationSink,
    pub clock: SharedClock,
    pub minter: SharedIdentifierMinter,
}

impl Collaborators {
    /// Uses the wall clock, random codes and a notifier that only logs.
    pub fn new(
        transactions: SharedTransactionRepository,
        refunds: SharedRefundRepository,
        gateway: SharedPaymentGateway,
    ) -> Self {
        Self {
            transactions,
            refunds,
            gateway,
            notifier: Arc::new(LoggingNotifier),
            clock: Arc::new(SystemClock),
            minter: Arc::new(RandomMinter::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: SharedNotificationSink) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_minter(mut self, minter: SharedIdentifierMinter) -> Self {
        self.minter = minter;
        self
    }
}

/// The main entry point for the lifecycle engine.
///
/// `PaymentEngine` owns no state of its own beyond the configuration; every operation
/// reads and writes through the repositories, so several engines may share one store.
pub struct PaymentEngine {
    transactions: TransactionLifecycle,
    refunds: RefundLifecycle,
    admin: AdministrativeOverride,
    config: EngineConfig,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `collaborators` - Repositories, gateway, notifier, clock and minter.
    /// * `config` - Engine settings. Rejected with a validation error if inconsistent.
    pub fn new(collaborators: Collaborators, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let events = EventPublisher::new(collaborators.notifier, config.notifications_enabled);

        let transactions = TransactionLifecycle {
            repository: collaborators.transactions.clone(),
            gateway: collaborators.gateway.clone(),
            clock: collaborators.clock.clone(),
            minter: collaborators.minter.clone(),
            events: events.clone(),
            default_currency: config.currency()?,
            retry_backoff: config.retry_backoff(),
        };
        let refunds = RefundLifecycle {
            refunds: collaborators.refunds.clone(),
            transactions: collaborators.transactions.clone(),
            gateway: collaborators.gateway,
            clock: collaborators.clock.clone(),
            minter: collaborators.minter,
            events,
            enforce_ceiling: config.enforce_refund_ceiling,
        };
        let admin = AdministrativeOverride {
            transactions: collaborators.transactions,
            refunds: collaborators.refunds,
            clock: collaborators.clock,
        };

        Ok(Self {
            transactions,
            refunds,
            admin,
            config,
        })
    }

    pub fn transactions(&self) -> &TransactionLifecycle {
        &self.transactions
    }

    pub fn refunds(&self) -> &RefundLifecycle {
        &self.refunds
    }

    pub fn admin(&self) -> &AdministrativeOverride {
        &self.admin
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates a transaction using the configured settlement mode.
    pub async fn submit(&self, request: CreateTransactionRequest) -> Result<Transaction> {
        self.transactions
            .create(request, self.config.settlement_mode)
            .await
    }
}
