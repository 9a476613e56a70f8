use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReconciliationError;
use crate::models::{DonationDomain, TransactionState};

/// A payment-processor event, already parsed and normalized by the
/// transport layer (IPN form fields, webhook JSON). (domain, domain_id)
/// is the at-least-once dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub domain: DonationDomain,
    pub domain_id: String,
    pub event_id: i64,
    pub donor_email: String,
    pub donor_alias: Option<String>,
    pub amount: Decimal,
    pub fee: Decimal,
    pub currency: String,
    pub state: TransactionState,
    pub time_received: DateTime<Utc>,
    pub comment: Option<String>,
    pub test: bool,
}

/// What reconciliation did with a notification. Every variant is
/// acknowledged to the processor; only `Applied` moves financial state.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    Applied {
        donation_id: i64,
        created: bool,
    },
    /// Redelivery of an already-completed donation; nothing written.
    DuplicateIgnored {
        donation_id: i64,
    },
    /// Persisted, but FLAGGED for operator review instead of counted.
    Flagged {
        donation_id: i64,
        reason: ReconciliationError,
    },
    /// Nothing persisted; conflict logged for operators.
    Rejected {
        reason: ReconciliationError,
    },
}

impl ReconciliationOutcome {
    pub fn advanced_financial_state(&self) -> bool {
        matches!(self, ReconciliationOutcome::Applied { .. })
    }
}
