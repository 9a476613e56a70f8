use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::ShippingState;

/// Outcome rows for prize draws, unique per (prize, winner). A donor's
/// row is reused across re-rolls: a drawn-again declined winner gets
/// `pending_count` bumped on the same record, so the counters form a
/// full history of offers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prize_winners")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub winner_id: i64,
    pub prize_id: i64,
    /// Offers awaiting a response.
    pub pending_count: i32,
    pub accept_count: i32,
    pub decline_count: i32,
    pub email_sent: bool,
    pub accept_email_sent_count: i32,
    /// Set by the acceptance workflow, not by drawing.
    pub accept_deadline: Option<DateTime<Utc>>,
    pub shipping_state: ShippingState,
    pub shipping_email_sent: bool,
    pub tracking_number: String,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))", nullable)]
    pub shipping_cost: Option<Decimal>,
    pub winner_notes: String,
}

impl Model {
    /// Wins that consume prize capacity: accepted plus still-pending
    /// offers. Declines free the slot back up.
    pub fn counts_toward_limit(&self) -> i32 {
        self.pending_count + self.accept_count
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
