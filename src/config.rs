use crate::domain::money::Currency;
use crate::error::{PaymentError, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How `create` settles a new transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Authorize during creation and return the outcome.
    #[default]
    Immediate,
    /// Persist as pending; `authorize` runs the attempt later.
    Deferred,
}

/// Engine settings. Every field has a default, so a config file only needs the
/// keys it wants to change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub default_currency: String,
    pub settlement_mode: SettlementMode,
    /// Delay written into `next_attempt_at` after a decline or failure.
    pub retry_backoff_secs: u64,
    /// Reject refund requests that would push the refunded total above the
    /// transaction amount.
    pub enforce_refund_ceiling: bool,
    pub notifications_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_currency: "BRL".to_string(),
            settlement_mode: SettlementMode::Immediate,
            retry_backoff_secs: 300,
            enforce_refund_ceiling: true,
            notifications_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Loads a JSON config file and validates it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            PaymentError::ValidationError(format!("Invalid config file: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.currency()?;
        if backoff(self.retry_backoff_secs).is_none() {
            return Err(PaymentError::ValidationError(
                "retry_backoff_secs is out of range".to_string(),
            ));
        }
        Ok(())
    }

    pub fn currency(&self) -> Result<Currency> {
        Currency::parse(&self.default_currency)
    }

    pub fn retry_backoff(&self) -> chrono::Duration {
        backoff(self.retry_backoff_secs)
            .or_else(|| backoff(Self::default().retry_backoff_secs))
            .unwrap_or_else(chrono::Duration::zero)
    }
}

fn backoff(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}
