use crate::domain::payment::PaymentMethod;
use crate::domain::ports::{AuthorizationRequest, GatewayOutcome, PaymentGateway, RefundSettlement};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;

/// Stand-in for a real acquirer: approves with a fixed probability per payment method.
///
/// Seed it to get a reproducible sequence of outcomes.
pub struct SimulatedGateway {
    rng: Mutex<StdRng>,
}

impl SimulatedGateway {
    pub const REFUND_APPROVAL_RATE: f64 = 0.8;

    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn approval_rate(method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::InstantTransfer => 0.9,
            PaymentMethod::CardCredit | PaymentMethod::CardDebit => 0.8,
            PaymentMethod::BankSlip => 0.7,
            PaymentMethod::WireTransfer | PaymentMethod::DigitalWallet => 0.8,
        }
    }

    fn roll(&self, probability: f64) -> Result<bool> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| PaymentError::internal("simulated gateway state poisoned"))?;
        Ok(rng.gen_bool(probability))
    }

    fn decline_for(method: PaymentMethod) -> GatewayOutcome {
        match method {
            PaymentMethod::InstantTransfer => GatewayOutcome::declined(
                "invalid_key",
                "Instant transfer key invalid or unavailable",
            ),
            PaymentMethod::CardCredit => GatewayOutcome::declined(
                "card_declined",
                "Credit card declined, check the card details or limit",
            ),
            PaymentMethod::CardDebit => GatewayOutcome::declined(
                "insufficient_funds",
                "Debit card declined, insufficient balance",
            ),
            PaymentMethod::BankSlip => GatewayOutcome::declined(
                "slip_rejected",
                "Bank slip could not be issued for the payer data",
            ),
            PaymentMethod::WireTransfer | PaymentMethod::DigitalWallet => {
                GatewayOutcome::declined("declined", "Payment declined by the provider")
            }
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn authorize(&self, request: AuthorizationRequest<'_>) -> Result<GatewayOutcome> {
        let approved = self.roll(Self::approval_rate(request.payment_method))?;
        debug!(reference = request.reference, approved, "simulated authorization");
        if approved {
            Ok(GatewayOutcome::Approved)
        } else {
            Ok(Self::decline_for(request.payment_method))
        }
    }

    async fn refund(&self, settlement: RefundSettlement<'_>) -> Result<GatewayOutcome> {
        let approved = self.roll(Self::REFUND_APPROVAL_RATE)?;
        debug!(refund_id = %settlement.refund_id, approved, "simulated refund");
        if approved {
            Ok(GatewayOutcome::Approved)
        } else {
            Ok(GatewayOutcome::declined(
                "refund_rejected",
                "Refund rejected by the provider",
            ))
        }
    }
}

/// A gateway that answers from a queue of prepared responses, approving once the queue
/// is empty. Deterministic by construction.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<GatewayOutcome>>>,
    calls: Mutex<u32>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: Result<GatewayOutcome>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn push_decline(&self, reason_code: &str, message: &str) {
        self.push(Ok(GatewayOutcome::declined(reason_code, message)));
    }

    pub fn push_unavailable(&self, message: &str) {
        self.push(Err(PaymentError::internal(message.to_string())));
    }

    /// Number of authorize and refund calls received.
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next(&self) -> Result<GatewayOutcome> {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(Ok(GatewayOutcome::Approved))
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn authorize(&self, _request: AuthorizationRequest<'_>) -> Result<GatewayOutcome> {
        self.next()
    }

    async fn refund(&self, _settlement: RefundSettlement<'_>) -> Result<GatewayOutcome> {
        self.next()
    }
}
