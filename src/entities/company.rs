use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An issuing business: owns numbered documents and tenders
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    /// Lower-case, unique; upper-cased inside document numbers
    #[sea_orm(unique)]
    pub slug: String,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::paper_entry::Entity")]
    PaperEntries,
    #[sea_orm(has_many = "super::paper_sequence::Entity")]
    PaperSequences,
    #[sea_orm(has_many = "super::tender::Entity")]
    Tenders,
}

impl Related<super::paper_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaperEntries.def()
    }
}

impl Related<super::paper_sequence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaperSequences.def()
    }
}

impl Related<super::tender::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
