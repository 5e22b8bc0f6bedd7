use super::blank_to_none;
use crate::{
    db::DbPool,
    entities::{
        company::{self, Entity as CompanyEntity, Model as CompanyModel},
        tender::{self, Entity as TenderEntity},
    },
    errors::ServiceError,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Lower-case words joined by single hyphens
pub static SLUG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid")
});

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 64),
        regex(path = "SLUG_RE", message = "Slug must be lower-case letters, digits and hyphens")
    )]
    pub slug: String,
    pub logo: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(
        length(min = 1, max = 64),
        regex(path = "SLUG_RE", message = "Slug must be lower-case letters, digits and hyphens")
    )]
    pub slug: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

/// A company with its tender portfolio size
#[derive(Debug, Clone)]
pub struct CompanyOverview {
    pub company: CompanyModel,
    pub tender_count: u64,
    pub total_tender_value: Decimal,
}

/// Issuing companies. Deleting one removes its documents and tenders with it.
#[derive(Clone)]
pub struct CompanyService {
    db_pool: Arc<DbPool>,
}

impl CompanyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(slug = %request.slug))]
    pub async fn create(&self, request: CreateCompanyRequest) -> Result<CompanyModel, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;

        self.ensure_slug_free(&request.slug, None).await?;

        let model = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            slug: Set(request.slug.clone()),
            logo: Set(blank_to_none(request.logo)),
            address: Set(blank_to_none(request.address)),
            phone: Set(blank_to_none(request.phone)),
            email: Set(blank_to_none(request.email)),
            created_at: Set(Utc::now()),
        };

        let company = model
            .insert(db)
            .await
            .map_err(|e| ServiceError::from_write_conflict(e, "company slug already exists"))?;

        info!(company_id = %company.id, "Company created");
        Ok(company)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, company_id: Uuid) -> Result<CompanyModel, ServiceError> {
        CompanyEntity::find_by_id(company_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, company_id = %company_id, "Failed to fetch company");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", company_id)))
    }

    /// All companies by name, each with its tender count and value
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CompanyOverview>, ServiceError> {
        let db = &*self.db_pool;
        let companies = CompanyEntity::find()
            .order_by_asc(company::Column::Name)
            .all(db)
            .await?;

        let tenders: Vec<(Uuid, Decimal)> = TenderEntity::find()
            .select_only()
            .column(tender::Column::CompanyId)
            .column(tender::Column::TotalValue)
            .into_tuple()
            .all(db)
            .await?;

        let mut portfolio: HashMap<Uuid, (u64, Decimal)> = HashMap::new();
        for (company_id, value) in tenders {
            let entry = portfolio.entry(company_id).or_insert((0, Decimal::ZERO));
            entry.0 += 1;
            entry.1 += value;
        }

        Ok(companies
            .into_iter()
            .map(|company| {
                let (tender_count, total_tender_value) = portfolio
                    .get(&company.id)
                    .copied()
                    .unwrap_or((0, Decimal::ZERO));
                CompanyOverview {
                    company,
                    tender_count,
                    total_tender_value,
                }
            })
            .collect())
    }

    #[instrument(skip(self, request), fields(company_id = %company_id))]
    pub async fn update(
        &self,
        company_id: Uuid,
        request: UpdateCompanyRequest,
    ) -> Result<CompanyModel, ServiceError> {
        request.validate()?;
        let db = &*self.db_pool;
        let existing = self.get(company_id).await?;

        if let Some(slug) = request.slug.as_deref() {
            self.ensure_slug_free(slug, Some(company_id)).await?;
        }

        let name = request
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| existing.name.clone());
        let mut model = existing.into_active_model();
        model.name = Set(name);
        if let Some(slug) = request.slug {
            model.slug = Set(slug);
        }
        if request.logo.is_some() {
            model.logo = Set(blank_to_none(request.logo));
        }
        if request.address.is_some() {
            model.address = Set(blank_to_none(request.address));
        }
        if request.phone.is_some() {
            model.phone = Set(blank_to_none(request.phone));
        }
        if request.email.is_some() {
            model.email = Set(blank_to_none(request.email));
        }

        let company = model
            .update(db)
            .await
            .map_err(|e| ServiceError::from_write_conflict(e, "company slug already exists"))?;
        info!(company_id = %company.id, "Company updated");
        Ok(company)
    }

    /// Removes the company; the schema cascades to documents, items, tenders,
    /// expenses and payments.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: Uuid) -> Result<(), ServiceError> {
        let result = CompanyEntity::delete_by_id(company_id)
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, company_id = %company_id, "Failed to delete company");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Company {} not found",
                company_id
            )));
        }
        info!(company_id = %company_id, "Company deleted");
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        let mut query = CompanyEntity::find().filter(company::Column::Slug.eq(slug));
        if let Some(id) = except {
            query = query.filter(company::Column::Id.ne(id));
        }
        if query.one(&*self.db_pool).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Company slug '{}' already exists",
                slug
            )));
        }
        Ok(())
    }
}
