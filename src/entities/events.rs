use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One marathon. `locked` freezes bids and donations against further
/// edits without elevated privilege; the country/region sets hang off
/// join tables and apply to prizes without their own filter.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short slug, word characters only, unique.
    #[sea_orm(unique)]
    pub short: String,
    pub name: String,
    pub receiver_name: String,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub target_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub minimum_donation: Decimal,
    /// ISO currency code payment notifications must match.
    pub paypal_currency: String,
    pub datetime: DateTime<Utc>,
    pub locked: bool,
    /// Days a drawn winner has to accept, measured from notification.
    pub prize_accept_deadline_delta: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
