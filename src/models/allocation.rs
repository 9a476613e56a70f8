use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::donation_bid_entity;

/// A bid allocation being validated before it exists in the database.
/// `id` is set when the caller is editing a persisted allocation, so the
/// cap check replaces that row's amount instead of double-counting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingBidAllocation {
    pub id: Option<i64>,
    pub bid_id: i64,
    pub amount: Decimal,
}

impl PendingBidAllocation {
    pub fn new(bid_id: i64, amount: Decimal) -> Self {
        PendingBidAllocation {
            id: None,
            bid_id,
            amount,
        }
    }
}

impl From<&donation_bid_entity::Model> for PendingBidAllocation {
    fn from(m: &donation_bid_entity::Model) -> Self {
        PendingBidAllocation {
            id: Some(m.id),
            bid_id: m.bid_id,
            amount: m.amount,
        }
    }
}
