use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::numbering::{format_sequence_identifier, needs_identifier};

/// A quotation/invoice-style document. `subtotal`, `tax_amount` and `total`
/// are derived from the items and rewritten whenever the items change.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "paper_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub client_id: Uuid,
    /// `{SLUG}/{YEAR}/{NNNN}`, assigned once at creation
    #[sea_orm(unique)]
    pub paper_number: String,
    pub date: NaiveDate,
    pub tax_percentage: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    pub prepared_by: Option<String>,
    pub delivered_by: Option<String>,
    pub received_by: Option<String>,
    pub created_at: DateTime<Utc>,
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
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
    #[sea_orm(has_many = "super::paper_item::Entity")]
    Items,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::paper_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Numbers the document on first insert: `{SLUG}/{YEAR}/{NNNN}` from the
    /// company's counter for the current year.
    async fn before_save<C>(self, db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if !insert {
            return Ok(active_model);
        }

        let existing = active_model.paper_number.try_as_ref().cloned();
        if !needs_identifier(existing.as_deref()) {
            return Ok(active_model);
        }

        let company_id = active_model
            .company_id
            .try_as_ref()
            .copied()
            .ok_or_else(|| DbErr::Custom("paper entry needs a company to be numbered".into()))?;
        let company = super::company::Entity::find_by_id(company_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("company {}", company_id)))?;

        // A slug handed over from a renamed company may already own some of
        // the identifiers this counter produces; skip past those.
        let year = Utc::now().year();
        let paper_number = loop {
            let sequence = super::paper_sequence::Entity::next_value(db, company_id, year).await?;
            let sequence = u32::try_from(sequence)
                .map_err(|_| DbErr::Custom(format!("invalid sequence value {}", sequence)))?;

            let candidate = format_sequence_identifier(&company.slug, year, sequence);
            let taken = Entity::find()
                .filter(Column::PaperNumber.eq(candidate.as_str()))
                .count(db)
                .await?;
            if taken == 0 {
                break candidate;
            }
        };

        active_model.paper_number = Set(paper_number);
        Ok(active_model)
    }
}
