use super::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Requested,
    UnderReview,
    Approved,
    Declined,
    Processing,
    Completed,
}

impl RefundStatus {
    /// Whether a refund in this state still counts against the transaction's amount.
    pub fn holds_funds(&self) -> bool {
        !matches!(self, Self::Declined)
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Declined => "declined",
            Self::Processing => "processing",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Refund {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub refund_amount: Amount,
    pub reason: String,
    pub status: RefundStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub refund_code: Option<String>,
}

impl Refund {
    pub fn new(
        transaction_id: Uuid,
        user_id: Uuid,
        refund_amount: Amount,
        reason: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            user_id,
            refund_amount,
            reason,
            status: RefundStatus::Requested,
            requested_at: now,
            processed_at: None,
            notes: None,
            refund_code: None,
        }
    }

    pub fn approve(&mut self, refund_code: String, now: DateTime<Utc>) {
        self.status = RefundStatus::Approved;
        self.refund_code = Some(refund_code);
        self.processed_at = Some(now);
    }

    pub fn decline(&mut self, notes: Option<String>, now: DateTime<Utc>) {
        self.status = RefundStatus::Declined;
        if notes.is_some() {
            self.notes = notes;
        }
        self.processed_at = Some(now);
    }

    /// Unconditional overwrite used by the administrative override.
    pub fn force_status(&mut self, status: RefundStatus, now: DateTime<Utc>) {
        self.status = status;
        self.processed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn requested() -> Refund {
        Refund::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Amount::new(dec!(10.00)).unwrap(),
            "Game does not start".to_string(),
            Utc.with_ymd_and_hms(2025, 9, 7, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_refund_is_requested() {
        let refund = requested();
        assert_eq!(refund.status, RefundStatus::Requested);
        assert!(refund.processed_at.is_none());
        assert!(refund.refund_code.is_none());
    }

    #[test]
    fn test_decline_keeps_existing_notes_when_none_given() {
        let mut refund = requested();
        refund.notes = Some("customer called".into());
        refund.decline(None, refund.requested_at);
        assert_eq!(refund.status, RefundStatus::Declined);
        assert_eq!(refund.notes.as_deref(), Some("customer called"));
        assert!(!refund.status.holds_funds());
    }

    #[test]
    fn test_force_status_stamps_processed_at() {
        let mut refund = requested();
        let at = Utc.with_ymd_and_hms(2025, 9, 8, 9, 30, 0).unwrap();
        refund.force_status(RefundStatus::Completed, at);
        assert_eq!(refund.status, RefundStatus::Completed);
        assert_eq!(refund.processed_at, Some(at));
    }
}
