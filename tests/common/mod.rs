#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use paysettle::application::engine::{Collaborators, PaymentEngine};
use paysettle::application::refunds::RefundRequest;
use paysettle::application::transactions::CreateTransactionRequest;
use paysettle::config::EngineConfig;
use paysettle::domain::events::{EventKind, LifecycleEvent};
use paysettle::domain::payment::{
    BankSlipData, CardData, InstantTransferData, PaymentData, PaymentMethod,
};
use paysettle::domain::ports::{IdentifierMinter, NotificationSink};
use paysettle::domain::transaction::Transaction;
use paysettle::error::{PaymentError, Result};
use paysettle::infrastructure::clock::FixedClock;
use paysettle::infrastructure::gateway::ScriptedGateway;
use paysettle::infrastructure::in_memory::{InMemoryRefundStore, InMemoryTransactionStore};
use paysettle::infrastructure::minter::RandomMinter;
use paysettle::infrastructure::notifier::ChannelNotifier;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct TestEngine {
    pub engine: PaymentEngine,
    pub gateway: Arc<ScriptedGateway>,
    pub clock: Arc<FixedClock>,
    pub events: mpsc::Receiver<LifecycleEvent>,
}

impl TestEngine {
    /// Kinds of every event delivered so far.
    pub fn drain_events(&mut self) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 7, 12, 0, 0).unwrap()
}

pub fn engine() -> TestEngine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> TestEngine {
    build(config, |c| c)
}

/// Builds an engine over fresh in-memory stores, a scripted gateway that approves unless
/// told otherwise, a fixed clock and a channel notifier.
pub fn build(
    config: EngineConfig,
    customize: impl FnOnce(Collaborators) -> Collaborators,
) -> TestEngine {
    let gateway = Arc::new(ScriptedGateway::new());
    let clock = Arc::new(FixedClock::new(start()));
    let (notifier, events) = ChannelNotifier::new(256);
    let collaborators = Collaborators::new(
        Arc::new(InMemoryTransactionStore::new()),
        Arc::new(InMemoryRefundStore::new()),
        gateway.clone(),
    )
    .with_clock(clock.clone())
    .with_notifier(Arc::new(notifier));

    TestEngine {
        engine: PaymentEngine::new(customize(collaborators), config).unwrap(),
        gateway,
        clock,
        events,
    }
}

pub fn card() -> CardData {
    CardData {
        number: "4111111111111111".to_string(),
        holder_name: "Ana Souza".to_string(),
        expiry: "12/30".to_string(),
        cvv: "123".to_string(),
        installments: Some(3),
    }
}

pub fn purchase(
    method: PaymentMethod,
    amount: Decimal,
    payment_data: PaymentData,
) -> CreateTransactionRequest {
    CreateTransactionRequest {
        user_id: Uuid::new_v4(),
        game_id: Uuid::new_v4(),
        amount,
        currency: None,
        payment_method: method,
        payment_data,
        notes: None,
    }
}

pub fn card_purchase(amount: Decimal) -> CreateTransactionRequest {
    purchase(
        PaymentMethod::CardCredit,
        amount,
        PaymentData::with_card(card()),
    )
}

pub fn instant_transfer_purchase(amount: Decimal) -> CreateTransactionRequest {
    purchase(
        PaymentMethod::InstantTransfer,
        amount,
        PaymentData::with_instant_transfer(InstantTransferData {
            key: "ana@example.com".to_string(),
        }),
    )
}

pub fn bank_slip_purchase(amount: Decimal) -> CreateTransactionRequest {
    purchase(
        PaymentMethod::BankSlip,
        amount,
        PaymentData::with_bank_slip(BankSlipData {
            tax_id: "123.456.789-00".to_string(),
            payer_name: "Ana Souza".to_string(),
            address: "Rua A, 100".to_string(),
            postal_code: "01310-100".to_string(),
            city: "Sao Paulo".to_string(),
            state: "SP".to_string(),
        }),
    )
}

pub fn refund_of(tx: &Transaction, amount: Decimal) -> RefundRequest {
    RefundRequest {
        transaction_id: tx.id,
        user_id: tx.user_id,
        amount,
        reason: "bought the wrong edition".to_string(),
    }
}

/// Always mints the same reference, to force a uniqueness conflict.
pub struct ConstantMinter;

impl IdentifierMinter for ConstantMinter {
    fn reference(&self) -> String {
        "AAAAAAAAAAAAAAAA".to_string()
    }

    fn authorization_code(&self, method: PaymentMethod) -> String {
        RandomMinter::new().authorization_code(method)
    }

    fn transaction_code(&self) -> String {
        RandomMinter::new().transaction_code()
    }

    fn refund_code(&self) -> String {
        RandomMinter::new().refund_code()
    }
}

/// A notification sink that is always down.
pub struct FailingNotifier;

#[async_trait]
impl NotificationSink for FailingNotifier {
    async fn notify(&self, _event: LifecycleEvent) -> Result<()> {
        Err(PaymentError::internal("mail server unreachable"))
    }
}
