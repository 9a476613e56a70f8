use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Derived per-donor aggregate over COMPLETED donations, one row per
/// (event, donor) plus a global row with `event_id` NULL. Recomputed by
/// the cache service and deleted outright when the donor has no
/// completed donations left in scope; never edited directly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "donor_caches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_id: Option<i64>,
    pub donor_id: i64,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub donation_total: Decimal,
    pub donation_count: i32,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub donation_avg: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub donation_max: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
