use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{CommentLanguage, CommentState, DonationDomain, ReadState, TransactionState};

/// One pledge. Key invariants, enforced by the donation service before
/// any write commits:
/// - sum of bid allocations <= amount, sum of ticket allocations <= amount
/// - a donor is required once `state` leaves PENDING
/// - (domain, domain_id) is unique and dedups processor callbacks
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub donor_id: Option<i64>,
    pub event_id: i64,
    pub domain: DonationDomain,
    /// External identity within the domain; derived from receipt time +
    /// donor email when the processor supplies none.
    pub domain_id: String,
    pub state: TransactionState,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub amount: Decimal,
    /// Processor fee, informational.
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub fee: Decimal,
    pub currency: String,
    pub time_received: DateTime<Utc>,
    pub comment: String,
    pub comment_state: CommentState,
    pub comment_language: CommentLanguage,
    pub read_state: ReadState,
    pub test_donation: bool,
    /// Free-form moderation log appended by operators and reconciliation.
    pub mod_comments: String,
}

impl Model {
    pub fn is_completed(&self) -> bool {
        self.state == TransactionState::Completed
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
