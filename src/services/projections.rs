use crate::{
    db::DbPool,
    domain::{
        aggregation::{
            distinct_companies, distinct_years, sum_by_status, text_matches,
            won_totals_by_company, CompanyTotal,
        },
        money::{non_negative_amount, required_amount, RawAmount},
    },
    entities::project_record::{self, Entity as ProjectRecordEntity, Model as ProjectRecordModel},
    errors::ServiceError,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_TITLE: &str = "Untitled Project";

/// Sentinel a form sends when the user types a new company name
pub const NEW_COMPANY: &str = "__new__";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter, ToSchema,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    Won,
    Lost,
    Pending,
}

impl ProjectStatus {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        ProjectStatus::from_str(raw.trim()).map_err(|_| {
            ServiceError::ValidationError(format!(
                "Unknown status '{}', expected WON, LOST or PENDING",
                raw
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProjectionRequest {
    /// Defaults to "Untitled Project"
    #[validate(length(max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    /// An existing company name, or `__new__` to use `company_new`
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[validate(length(max = 200))]
    pub company_new: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Customer is required"))]
    pub customer: String,
    #[schema(value_type = f64, example = 25000)]
    pub amount: Option<RawAmount>,
    /// `YYYY-MM-DD`
    #[schema(example = "2025-03-14")]
    pub project_date: String,
    #[schema(example = "PENDING")]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectionRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub company: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub customer: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<RawAmount>,
    pub project_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectionFilter {
    pub company: Option<String>,
    pub status: Option<String>,
    pub year: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub q: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectionDashboard {
    pub records: Vec<ProjectRecordModel>,
    pub total_won: Decimal,
    pub total_lost: Decimal,
    pub total_pending: Decimal,
    pub company_totals: Vec<CompanyTotal>,
    /// Every active company name, for filter choices
    pub companies: Vec<String>,
    /// Every active year, newest first
    pub years: Vec<i32>,
}

fn parse_project_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ServiceError::BadRequest("Invalid project date".into()))
}

/// Picks the company name from the select value or the new-name field
fn resolve_company_name(
    selected: Option<&str>,
    new_name: Option<&str>,
) -> Result<String, ServiceError> {
    let selected = selected.map(str::trim).filter(|s| !s.is_empty());
    let new_name = new_name.map(str::trim).filter(|s| !s.is_empty());

    match (selected, new_name) {
        (Some(NEW_COMPANY), Some(name)) | (None, Some(name)) => Ok(name.to_string()),
        (Some(NEW_COMPANY), None) => Err(ServiceError::ValidationError(
            "Please enter a new company name".into(),
        )),
        (Some(name), _) => Ok(name.to_string()),
        (None, None) => Err(ServiceError::ValidationError(
            "Please select a company".into(),
        )),
    }
}

/// Sales projections. Records are archived, never deleted.
#[derive(Clone)]
pub struct ProjectionService {
    db_pool: Arc<DbPool>,
}

impl ProjectionService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(customer = %request.customer))]
    pub async fn create(
        &self,
        request: CreateProjectionRequest,
    ) -> Result<ProjectRecordModel, ServiceError> {
        request.validate()?;
        let company = resolve_company_name(request.company.as_deref(), request.company_new.as_deref())?;
        let project_date = parse_project_date(&request.project_date)?;
        let status = ProjectStatus::parse(&request.status)?;
        let amount = required_amount(request.amount.as_ref(), "amount")?;
        let amount = non_negative_amount(&RawAmount::from(amount), "amount")?;

        let title = request
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let record = project_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            description: Set(request.description.unwrap_or_default()),
            company: Set(company),
            customer: Set(request.customer.trim().to_string()),
            amount: Set(amount),
            project_date: Set(project_date),
            status: Set(status.to_string()),
            is_active: Set(true),
            // derived from project_date on save
            year: Set(0),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(record_id = %record.id, year = record.year, "Projection recorded");
        Ok(record)
    }

    #[instrument(skip(self, request), fields(record_id = %record_id))]
    pub async fn update(
        &self,
        record_id: Uuid,
        request: UpdateProjectionRequest,
    ) -> Result<ProjectRecordModel, ServiceError> {
        request.validate()?;
        let existing = self.detail(record_id).await?;

        let project_date = match request.project_date.as_deref() {
            Some(raw) => parse_project_date(raw)?,
            None => existing.project_date,
        };

        let mut model = existing.into_active_model();
        model.project_date = Set(project_date);
        if let Some(title) = request.title {
            model.title = Set(title.trim().to_string());
        }
        if let Some(description) = request.description {
            model.description = Set(description);
        }
        if let Some(company) = request.company {
            model.company = Set(company.trim().to_string());
        }
        if let Some(customer) = request.customer {
            model.customer = Set(customer.trim().to_string());
        }
        if let Some(raw) = request.amount.as_ref() {
            model.amount = Set(non_negative_amount(raw, "amount")?);
        }
        if let Some(status) = request.status.as_deref() {
            model.status = Set(ProjectStatus::parse(status)?.to_string());
        }

        let record = model.update(&*self.db_pool).await?;
        info!(record_id = %record.id, year = record.year, "Projection updated");
        Ok(record)
    }

    /// Active records matching the filter, latest project date first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: &ProjectionFilter,
    ) -> Result<Vec<ProjectRecordModel>, ServiceError> {
        let mut query =
            ProjectRecordEntity::find().filter(project_record::Column::IsActive.eq(true));

        if let Some(company) = filter.company.as_deref().filter(|c| !c.trim().is_empty()) {
            query = query.filter(project_record::Column::Company.eq(company.trim()));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status = ProjectStatus::parse(status)?;
            query = query.filter(project_record::Column::Status.eq(status.to_string()));
        }
        if let Some(year) = filter.year {
            query = query.filter(project_record::Column::Year.eq(year));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(project_record::Column::ProjectDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(project_record::Column::ProjectDate.lte(to));
        }

        let records = query
            .order_by_desc(project_record::Column::ProjectDate)
            .order_by_desc(project_record::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        Ok(match filter.q.as_deref() {
            Some(q) => records
                .into_iter()
                .filter(|r| text_matches(q, &[&r.title, &r.customer, &r.company]))
                .collect(),
            None => records,
        })
    }

    /// Won/lost totals and per-company won totals over the filtered active
    /// records, plus the filter choices over all active records.
    #[instrument(skip(self))]
    pub async fn dashboard(
        &self,
        filter: &ProjectionFilter,
    ) -> Result<ProjectionDashboard, ServiceError> {
        let records = self.list(filter).await?;

        let by_status = sum_by_status(records.iter().map(|r| (r.status.as_str(), r.amount)));
        let status_total = |status: ProjectStatus| {
            by_status
                .get(status.as_ref())
                .copied()
                .unwrap_or(Decimal::ZERO)
        };
        let company_totals = won_totals_by_company(
            records
                .iter()
                .map(|r| (r.company.as_str(), r.status.as_str(), r.amount)),
        );

        let choices: Vec<(String, i32)> = ProjectRecordEntity::find()
            .select_only()
            .column(project_record::Column::Company)
            .column(project_record::Column::Year)
            .filter(project_record::Column::IsActive.eq(true))
            .into_tuple()
            .all(&*self.db_pool)
            .await?;

        Ok(ProjectionDashboard {
            total_won: status_total(ProjectStatus::Won),
            total_lost: status_total(ProjectStatus::Lost),
            total_pending: status_total(ProjectStatus::Pending),
            company_totals,
            companies: distinct_companies(choices.iter().map(|(c, _)| c.clone())),
            years: distinct_years(choices.iter().map(|(_, y)| *y)),
            records,
        })
    }

    /// An active record; archived ones read as missing
    #[instrument(skip(self))]
    pub async fn detail(&self, record_id: Uuid) -> Result<ProjectRecordModel, ServiceError> {
        ProjectRecordEntity::find_by_id(record_id)
            .filter(project_record::Column::IsActive.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Projection {} not found", record_id)))
    }

    /// Soft delete. Archiving an archived record changes nothing.
    #[instrument(skip(self))]
    pub async fn archive(&self, record_id: Uuid) -> Result<ProjectRecordModel, ServiceError> {
        let record = ProjectRecordEntity::find_by_id(record_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Projection {} not found", record_id)))?;

        if !record.is_active {
            return Ok(record);
        }

        let mut model = record.into_active_model();
        model.is_active = Set(false);
        let record = model.update(&*self.db_pool).await?;
        info!(record_id = %record.id, "Projection archived");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_is_case_insensitive_and_stored_upper() {
        assert_eq!(ProjectStatus::parse("won").unwrap(), ProjectStatus::Won);
        assert_eq!(ProjectStatus::Pending.to_string(), "PENDING");
        assert_matches!(
            ProjectStatus::parse("maybe"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn company_name_comes_from_select_or_new_field() {
        assert_eq!(resolve_company_name(Some("Acme"), None).unwrap(), "Acme");
        assert_eq!(
            resolve_company_name(Some(NEW_COMPANY), Some(" Zed Ltd ")).unwrap(),
            "Zed Ltd"
        );
        assert_eq!(resolve_company_name(None, Some("Zed Ltd")).unwrap(), "Zed Ltd");
        assert!(resolve_company_name(Some(NEW_COMPANY), Some("  ")).is_err());
        assert!(resolve_company_name(None, None).is_err());
    }

    #[test]
    fn project_dates_are_iso() {
        assert_eq!(
            parse_project_date("2025-02-28").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_matches!(
            parse_project_date("28/02/2025"),
            Err(ServiceError::BadRequest(ref msg)) if msg == "Invalid project date"
        );
    }
}
