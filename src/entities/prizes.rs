use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{DrawMethod, PrizeState};

/// A drawable reward. Draw-window anchoring: either an explicit
/// starttime/endtime pair or a start/end run range; donations received
/// inside the window qualify donors for RANDOM/SUM prizes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "prizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub description: String,
    pub image: String,
    /// Qualification band for non-ticket draws.
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub minimum_bid: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))", nullable)]
    pub maximum_bid: Option<Decimal>,
    pub draw_method: DrawMethod,
    /// Ticket prizes only: qualifying donations earn tickets without an
    /// explicit allocation step.
    pub auto_tickets: bool,
    pub max_winners: i32,
    /// Times one donor may win this prize; 1 means no repeats.
    pub max_multi_win: i32,
    pub requires_shipping: bool,
    /// Use the prize's own country/region sets instead of the event's.
    pub custom_country_filter: bool,
    pub start_run_id: Option<i64>,
    pub end_run_id: Option<i64>,
    pub starttime: Option<DateTime<Utc>>,
    pub endtime: Option<DateTime<Utc>>,
    pub state: PrizeState,
    /// Who contributed the prize.
    pub provider: String,
    pub accept_email_sent: bool,
}

impl Model {
    /// Whether a donor's qualifying-donation total falls in the prize's
    /// minimum/maximum band.
    pub fn accepts_total(&self, total: Decimal) -> bool {
        if total < self.minimum_bid {
            return false;
        }
        match self.maximum_bid {
            Some(max) => total <= max,
            None => true,
        }
    }

    pub fn uses_tickets(&self) -> bool {
        self.draw_method == DrawMethod::Tickets
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
