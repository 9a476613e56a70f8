use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::BidState;

/// An incentive target. Bids form a shallow tree: a parent challenge with
/// child options, where only `is_target` nodes take allocations directly
/// and ancestors aggregate their children. `total` and `count` are
/// derived by the bid service, never set by hand.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bids")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: i64,
    pub speedrun_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: String,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))", nullable)]
    pub goal: Option<Decimal>,
    pub is_target: bool,
    /// Donors may suggest new child options (arriving as PENDING).
    pub allow_user_options: bool,
    pub state: BidState,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub total: Decimal,
    pub count: i32,
}

impl Model {
    pub fn goal_reached(&self) -> bool {
        match self.goal {
            Some(goal) => self.total >= goal,
            None => false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
