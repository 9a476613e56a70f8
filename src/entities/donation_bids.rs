use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Part of one donation pledged toward one bid. Counted against the
/// donation's allocation cap; only COMPLETED donations feed bid totals.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "donation_bids")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub donation_id: i64,
    pub bid_id: i64,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
