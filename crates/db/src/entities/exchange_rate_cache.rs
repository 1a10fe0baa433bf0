//! Durable exchange rate cache entity. One row per currency pair.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exchange_rate_cache")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub base_currency: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub quote_currency: String,
    /// Rate at four decimal places, stored as its scaled integer.
    pub rate_scaled: i64,
    pub fetched_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
