use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::DonorVisibility;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "donors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stored lowercase; reconciliation matches case-insensitively.
    #[sea_orm(unique)]
    pub email: String,
    pub alias: Option<String>,
    pub firstname: String,
    pub lastname: String,
    #[sea_orm(unique)]
    pub paypal_email: Option<String>,
    pub visibility: DonorVisibility,
    pub address_street: String,
    pub address_city: String,
    pub address_state: String,
    pub address_zip: String,
    pub address_country_id: Option<i64>,
}

impl Model {
    /// Public display name honoring the donor's visibility choice.
    pub fn visible_name(&self) -> String {
        match self.visibility {
            DonorVisibility::FullName => format!("{} {}", self.firstname, self.lastname),
            DonorVisibility::FirstName => format!("{} {}.", self.firstname, self.lastname.chars().take(1).collect::<String>()),
            DonorVisibility::Alias => self
                .alias
                .clone()
                .unwrap_or_else(|| "(No Name)".to_string()),
            DonorVisibility::Anonymous => "(Anonymous)".to_string(),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
