use sea_orm::entity::prelude::*;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-(company, year) document counter. `last_value` is the highest suffix
/// ever handed out and never decreases.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paper_sequences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub company_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    pub last_value: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Entity {
    /// Atomically bumps the (company, year) counter and returns the new value.
    ///
    /// A single upsert creates the row at 1 or increments it in place, so two
    /// writers can never read the same value; the loser of a write race gets
    /// a lock or unique-violation error. Run it inside the transaction that
    /// stores the document so a rollback also returns the number.
    pub async fn next_value<C>(db: &C, company_id: Uuid, year: i32) -> Result<i32, DbErr>
    where
        C: ConnectionTrait,
    {
        let seed = ActiveModel {
            company_id: Set(company_id),
            year: Set(year),
            last_value: Set(1),
        };

        Entity::insert(seed)
            .on_conflict(
                OnConflict::columns([Column::CompanyId, Column::Year])
                    .value(
                        Column::LastValue,
                        Expr::col((Entity, Column::LastValue)).add(1),
                    )
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        Entity::find_by_id((company_id, year))
            .one(db)
            .await?
            .map(|row| row.last_value)
            .ok_or_else(|| DbErr::RecordNotFound("paper sequence row vanished".into()))
    }
}
