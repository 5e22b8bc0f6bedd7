use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sales projection. `company` and `customer` are free text, not keys.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company: String,
    pub customer: String,
    pub amount: Decimal,
    pub project_date: NaiveDate,
    /// WON, LOST or PENDING
    pub status: String,
    /// Cleared on archive; archived rows stay in the table
    pub is_active: bool,
    /// Mirrors `project_date.year()`
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let Some(project_date) = active_model.project_date.try_as_ref().copied() {
            active_model.year = Set(project_date.year());
        }
        Ok(active_model)
    }
}
