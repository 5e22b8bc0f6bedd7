use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::totals::line_amount;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paper_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entry_id: Uuid,
    /// Zero-based order within the document
    pub position: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Always `quantity * unit_price`; overwritten on every save
    pub amount: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::paper_entry::Entity",
        from = "Column::EntryId",
        to = "super::paper_entry::Column::Id",
        on_delete = "Cascade"
    )]
    Entry,
}

impl Related<super::paper_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let quantity = active_model.quantity.try_as_ref().copied();
        let unit_price = active_model.unit_price.try_as_ref().copied();
        match (quantity, unit_price) {
            (Some(quantity), Some(unit_price)) => {
                active_model.amount = Set(line_amount(quantity, unit_price));
            }
            _ => {
                return Err(DbErr::Custom(
                    "paper item needs quantity and unit_price to derive its amount".into(),
                ))
            }
        }

        Ok(active_model)
    }
}
