use super::blank_to_none;
use crate::{
    db::DbPool,
    domain::{
        aggregation::{
            company_dashboard, tender_summary, text_matches, CompanyDashboard, TenderFigures,
            TenderSummary,
        },
        money::{non_negative_amount, required_amount, RawAmount},
        tender::{PaymentStatus, TenderFinancials},
    },
    entities::{
        company::{self, Entity as CompanyEntity},
        expense::{self, Entity as ExpenseEntity},
        payment::{self, Entity as PaymentEntity},
        tender::{self, Entity as TenderEntity},
    },
    errors::ServiceError,
};
use chrono::{NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    IntoActiveModel, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, TransactionTrait,
};
use serde::Deserialize;
use std::{collections::HashMap, str::FromStr, sync::Arc};
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTenderRequest {
    #[validate(length(min = 1, max = 100, message = "Tender number is required"))]
    pub tender_no: String,
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Client name is required"))]
    pub client_name: String,
    #[schema(value_type = f64, example = 250000)]
    pub total_value: RawAmount,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTenderRequest {
    #[validate(length(min = 1, max = 100))]
    pub tender_no: Option<String>,
    pub company_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub client_name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub total_value: Option<RawAmount>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TenderFilter {
    pub company_id: Option<Uuid>,
    /// Stored payment status, e.g. `Partially Paid` (or `Partially_Paid`)
    pub status: Option<String>,
    /// Lower bound on the start date
    pub date_from: Option<NaiveDate>,
    /// Upper bound on the end date
    pub date_to: Option<NaiveDate>,
    pub q: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateExpenseRequest {
    pub tender_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Category is required"))]
    pub category: String,
    pub description: Option<String>,
    #[schema(value_type = f64, example = 1200.5)]
    pub amount: Option<RawAmount>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateExpenseRequest {
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<RawAmount>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct ExpenseFilter {
    pub company_id: Option<Uuid>,
    pub tender_id: Option<Uuid>,
    pub page: u64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentRequest {
    pub tender_id: Uuid,
    #[schema(value_type = f64, example = 50000)]
    pub amount: Option<RawAmount>,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePaymentRequest {
    #[schema(value_type = Option<f64>)]
    pub amount: Option<RawAmount>,
    pub date: Option<NaiveDate>,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// A tender with everything derived from its expenses and payments
#[derive(Debug, Clone)]
pub struct TenderRow {
    pub tender: tender::Model,
    pub company_name: String,
    pub financials: TenderFinancials,
    pub expense_count: u64,
    pub payment_count: u64,
}

#[derive(Debug, Clone)]
pub struct TenderDetail {
    pub row: TenderRow,
    pub expenses: Vec<expense::Model>,
    pub payments: Vec<payment::Model>,
}

#[derive(Debug, Clone)]
pub struct ExpenseRow {
    pub expense: expense::Model,
    pub tender_no: String,
    pub company_name: String,
    /// `"{tender_no} - {company}"`
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ExpensePage {
    pub rows: Vec<ExpenseRow>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    /// Sum over the whole filtered set, not just this page
    pub total_amount: Decimal,
}

/// Accepts the stored status text or its summary key
fn parse_status_filter(raw: &str) -> Result<PaymentStatus, ServiceError> {
    let raw = raw.trim();
    PaymentStatus::from_str(raw)
        .or_else(|_| PaymentStatus::from_str(&raw.replace('_', " ")))
        .map_err(|_| ServiceError::ValidationError(format!("Unknown payment status '{}'", raw)))
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ServiceError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ServiceError::ValidationError(
            "End date must not be before start date".into(),
        )),
        _ => Ok(()),
    }
}

fn expense_label(tender_no: &str, company_name: &str) -> String {
    format!("{} - {}", tender_no, company_name)
}

fn group_by_tender(rows: Vec<(Uuid, Decimal)>) -> HashMap<Uuid, Vec<Decimal>> {
    let mut grouped: HashMap<Uuid, Vec<Decimal>> = HashMap::new();
    for (tender_id, amount) in rows {
        grouped.entry(tender_id).or_default().push(amount);
    }
    grouped
}

/// Expense amounts of the given tenders, grouped per tender
async fn expense_amounts<C>(
    db: &C,
    tender_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Decimal>>, ServiceError>
where
    C: ConnectionTrait,
{
    if tender_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, Decimal)> = ExpenseEntity::find()
        .select_only()
        .column(expense::Column::TenderId)
        .column(expense::Column::Amount)
        .filter(expense::Column::TenderId.is_in(tender_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(group_by_tender(rows))
}

/// Payment amounts of the given tenders, grouped per tender
async fn payment_amounts<C>(
    db: &C,
    tender_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Decimal>>, ServiceError>
where
    C: ConnectionTrait,
{
    if tender_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, Decimal)> = PaymentEntity::find()
        .select_only()
        .column(payment::Column::TenderId)
        .column(payment::Column::Amount)
        .filter(payment::Column::TenderId.is_in(tender_ids.to_vec()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(group_by_tender(rows))
}

/// Re-derives the cached payment status from the tender's current payments.
/// Must run inside the transaction of the write that changed them.
async fn refresh_payment_status<C>(db: &C, tender_id: Uuid) -> Result<PaymentStatus, ServiceError>
where
    C: ConnectionTrait,
{
    let tender = TenderEntity::find_by_id(tender_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::BadRequest("Tender not found".into()))?;

    let paid: Vec<Decimal> = PaymentEntity::find()
        .select_only()
        .column(payment::Column::Amount)
        .filter(payment::Column::TenderId.eq(tender_id))
        .into_tuple()
        .all(db)
        .await?;
    let status = PaymentStatus::derive(paid.into_iter().sum(), tender.total_value);

    if tender.payment_status != status.as_ref() {
        TenderEntity::update_many()
            .col_expr(tender::Column::PaymentStatus, Expr::value(status.to_string()))
            .filter(tender::Column::Id.eq(tender_id))
            .exec(db)
            .await?;
        counter!("tenders.payment_status_changed", 1);
        debug!(tender_id = %tender_id, from = %tender.payment_status, to = %status, "Payment status changed");
    }
    Ok(status)
}

/// Tenders with their expenses and payments, and the reports built on them
#[derive(Clone)]
pub struct TenderService {
    db_pool: Arc<DbPool>,
    expense_page_size: u64,
    expense_feed_limit: u64,
}

impl TenderService {
    pub fn new(db_pool: Arc<DbPool>, expense_page_size: u64, expense_feed_limit: u64) -> Self {
        Self {
            db_pool,
            expense_page_size: expense_page_size.max(1),
            expense_feed_limit,
        }
    }

    #[instrument(skip(self, request), fields(tender_no = %request.tender_no))]
    pub async fn create(&self, request: CreateTenderRequest) -> Result<TenderDetail, ServiceError> {
        request.validate()?;
        let total_value = non_negative_amount(&request.total_value, "total_value")?;
        check_dates(request.start_date, request.end_date)?;
        let db = &*self.db_pool;

        if CompanyEntity::find_by_id(request.company_id).one(db).await?.is_none() {
            return Err(ServiceError::BadRequest("Company not found".into()));
        }
        let tender_no = request.tender_no.trim().to_string();
        self.ensure_tender_no_free(&tender_no, None).await?;

        let tender = tender::ActiveModel {
            id: Set(Uuid::new_v4()),
            tender_no: Set(tender_no),
            company_id: Set(request.company_id),
            client_name: Set(request.client_name.trim().to_string()),
            total_value: Set(total_value),
            payment_status: Set(PaymentStatus::derive(Decimal::ZERO, total_value).to_string()),
            start_date: Set(request.start_date),
            end_date: Set(request.end_date),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_write_conflict(e, "tender number already exists"))?;

        info!(tender_id = %tender.id, "Tender created");
        self.get(tender.id).await
    }

    /// Updates the tender; the payment status is re-derived against the new
    /// value in the same transaction.
    #[instrument(skip(self, request), fields(tender_id = %tender_id))]
    pub async fn update(
        &self,
        tender_id: Uuid,
        request: UpdateTenderRequest,
    ) -> Result<TenderDetail, ServiceError> {
        request.validate()?;
        let total_value = match request.total_value.as_ref() {
            Some(raw) => Some(non_negative_amount(raw, "total_value")?),
            None => None,
        };
        if let Some(tender_no) = request.tender_no.as_deref() {
            self.ensure_tender_no_free(tender_no.trim(), Some(tender_id)).await?;
        }

        let txn = self.db_pool.begin().await?;
        let existing = TenderEntity::find_by_id(tender_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tender {} not found", tender_id)))?;

        if let Some(company_id) = request.company_id {
            if CompanyEntity::find_by_id(company_id).one(&txn).await?.is_none() {
                return Err(ServiceError::BadRequest("Company not found".into()));
            }
        }
        let start_date = request.start_date.or(existing.start_date);
        let end_date = request.end_date.or(existing.end_date);
        check_dates(start_date, end_date)?;

        let mut model = existing.into_active_model();
        model.start_date = Set(start_date);
        model.end_date = Set(end_date);
        if let Some(tender_no) = request.tender_no {
            model.tender_no = Set(tender_no.trim().to_string());
        }
        if let Some(company_id) = request.company_id {
            model.company_id = Set(company_id);
        }
        if let Some(client_name) = request.client_name {
            model.client_name = Set(client_name.trim().to_string());
        }
        if let Some(total_value) = total_value {
            model.total_value = Set(total_value);
        }
        model
            .update(&txn)
            .await
            .map_err(|e| ServiceError::from_write_conflict(e, "tender number already exists"))?;
        refresh_payment_status(&txn, tender_id).await?;
        txn.commit().await?;

        info!(tender_id = %tender_id, "Tender updated");
        self.get(tender_id).await
    }

    /// Removes the tender with its expenses and payments
    #[instrument(skip(self))]
    pub async fn delete(&self, tender_id: Uuid) -> Result<(), ServiceError> {
        let result = TenderEntity::delete_by_id(tender_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Tender {} not found", tender_id)));
        }
        info!(tender_id = %tender_id, "Tender deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, tender_id: Uuid) -> Result<TenderDetail, ServiceError> {
        let db = &*self.db_pool;
        let tender = TenderEntity::find_by_id(tender_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tender {} not found", tender_id)))?;
        let company_name = CompanyEntity::find_by_id(tender.company_id)
            .one(db)
            .await?
            .map(|c| c.name)
            .unwrap_or_default();

        let expenses = ExpenseEntity::find()
            .filter(expense::Column::TenderId.eq(tender_id))
            .order_by_desc(expense::Column::Date)
            .order_by_desc(expense::Column::CreatedAt)
            .all(db)
            .await?;
        let payments = PaymentEntity::find()
            .filter(payment::Column::TenderId.eq(tender_id))
            .order_by_desc(payment::Column::Date)
            .order_by_desc(payment::Column::CreatedAt)
            .all(db)
            .await?;

        let financials = TenderFinancials::compute(
            tender.total_value,
            expenses.iter().map(|e| e.amount),
            payments.iter().map(|p| p.amount),
        );
        Ok(TenderDetail {
            row: TenderRow {
                tender,
                company_name,
                financials,
                expense_count: expenses.len() as u64,
                payment_count: payments.len() as u64,
            },
            expenses,
            payments,
        })
    }

    /// Newest first. The status filter reads the stored status; each row
    /// carries a freshly derived one.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &TenderFilter) -> Result<Vec<TenderRow>, ServiceError> {
        let db = &*self.db_pool;
        let mut query = TenderEntity::find();

        if let Some(company_id) = filter.company_id {
            query = query.filter(tender::Column::CompanyId.eq(company_id));
        }
        if let Some(status) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
            let status = parse_status_filter(status)?;
            query = query.filter(tender::Column::PaymentStatus.eq(status.to_string()));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(tender::Column::StartDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(tender::Column::EndDate.lte(to));
        }

        let tenders = query
            .order_by_desc(tender::Column::CreatedAt)
            .order_by_asc(tender::Column::TenderNo)
            .all(db)
            .await?;
        let companies = self.company_names().await?;

        let tenders: Vec<tender::Model> = match filter.q.as_deref() {
            Some(q) => tenders
                .into_iter()
                .filter(|t| {
                    let company = companies.get(&t.company_id).map(String::as_str).unwrap_or("");
                    text_matches(q, &[&t.tender_no, &t.client_name, company])
                })
                .collect(),
            None => tenders,
        };

        let ids: Vec<Uuid> = tenders.iter().map(|t| t.id).collect();
        let expenses = expense_amounts(db, &ids).await?;
        let payments = payment_amounts(db, &ids).await?;

        Ok(tenders
            .into_iter()
            .map(|tender| {
                let spent = expenses.get(&tender.id).cloned().unwrap_or_default();
                let paid = payments.get(&tender.id).cloned().unwrap_or_default();
                TenderRow {
                    company_name: companies.get(&tender.company_id).cloned().unwrap_or_default(),
                    financials: TenderFinancials::compute(
                        tender.total_value,
                        spent.iter().copied(),
                        paid.iter().copied(),
                    ),
                    expense_count: spent.len() as u64,
                    payment_count: paid.len() as u64,
                    tender,
                }
            })
            .collect())
    }

    /// Portfolio totals across every tender
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<TenderSummary, ServiceError> {
        let total_companies = CompanyEntity::find().count(&*self.db_pool).await?;
        let figures = self.figures().await?;
        Ok(tender_summary(total_companies, &figures))
    }

    /// Per-company parallel arrays for charting
    #[instrument(skip(self))]
    pub async fn by_company(&self) -> Result<CompanyDashboard, ServiceError> {
        let companies: Vec<(Uuid, String)> = self.company_names().await?.into_iter().collect();
        let figures = self.figures().await?;
        Ok(company_dashboard(&companies, &figures))
    }

    #[instrument(skip(self, request), fields(tender_id = %request.tender_id))]
    pub async fn create_expense(
        &self,
        request: CreateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        let amount = required_amount(request.amount.as_ref(), "amount")?;
        let amount = non_negative_amount(&RawAmount::from(amount), "amount")?;
        let db = &*self.db_pool;

        if TenderEntity::find_by_id(request.tender_id).one(db).await?.is_none() {
            return Err(ServiceError::BadRequest("Tender not found".into()));
        }

        let expense = expense::ActiveModel {
            id: Set(Uuid::new_v4()),
            tender_id: Set(request.tender_id),
            category: Set(request.category.trim().to_string()),
            description: Set(blank_to_none(request.description)),
            amount: Set(amount),
            date: Set(request.date.unwrap_or_else(|| Utc::now().date_naive())),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!(expense_id = %expense.id, "Expense recorded");
        Ok(expense)
    }

    #[instrument(skip(self, request), fields(expense_id = %expense_id))]
    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        request: UpdateExpenseRequest,
    ) -> Result<expense::Model, ServiceError> {
        request.validate()?;
        let existing = ExpenseEntity::find_by_id(expense_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Expense {} not found", expense_id)))?;

        let amount = match request.amount.as_ref() {
            Some(raw) => non_negative_amount(raw, "amount")?,
            None => existing.amount,
        };
        let mut model = existing.into_active_model();
        model.amount = Set(amount);
        if let Some(category) = request.category {
            model.category = Set(category.trim().to_string());
        }
        if request.description.is_some() {
            model.description = Set(blank_to_none(request.description));
        }
        if let Some(date) = request.date {
            model.date = Set(date);
        }

        let expense = model.update(&*self.db_pool).await?;
        info!(expense_id = %expense.id, "Expense updated");
        Ok(expense)
    }

    #[instrument(skip(self))]
    pub async fn delete_expense(&self, expense_id: Uuid) -> Result<(), ServiceError> {
        let result = ExpenseEntity::delete_by_id(expense_id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Expense {} not found", expense_id)));
        }
        info!(expense_id = %expense_id, "Expense deleted");
        Ok(())
    }

    /// Newest first, one page at a time, with the total over every match
    #[instrument(skip(self))]
    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> Result<ExpensePage, ServiceError> {
        let db = &*self.db_pool;
        let mut query =
            ExpenseEntity::find().join(JoinType::InnerJoin, expense::Relation::Tender.def());
        if let Some(company_id) = filter.company_id {
            query = query.filter(tender::Column::CompanyId.eq(company_id));
        }
        if let Some(tender_id) = filter.tender_id {
            query = query.filter(expense::Column::TenderId.eq(tender_id));
        }

        let amounts: Vec<Decimal> = query
            .clone()
            .select_only()
            .column(expense::Column::Amount)
            .into_tuple()
            .all(db)
            .await?;
        let total_amount = amounts.into_iter().sum();

        let page = filter.page.max(1);
        let paginator = query
            .order_by_desc(expense::Column::Date)
            .order_by_desc(expense::Column::CreatedAt)
            .paginate(db, self.expense_page_size);
        let total = paginator.num_items().await?;
        let expenses = paginator.fetch_page(page - 1).await?;

        Ok(ExpensePage {
            rows: self.label_expenses(expenses).await?,
            total,
            page,
            per_page: self.expense_page_size,
            total_amount,
        })
    }

    /// The latest expenses, labelled for a client-side table
    #[instrument(skip(self))]
    pub async fn expense_feed(&self) -> Result<Vec<ExpenseRow>, ServiceError> {
        let expenses = ExpenseEntity::find()
            .order_by_desc(expense::Column::Date)
            .order_by_desc(expense::Column::CreatedAt)
            .limit(self.expense_feed_limit)
            .all(&*self.db_pool)
            .await?;
        self.label_expenses(expenses).await
    }

    /// Records a payment and re-derives the tender's status atomically
    #[instrument(skip(self, request), fields(tender_id = %request.tender_id))]
    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<payment::Model, ServiceError> {
        request.validate()?;
        let amount = required_amount(request.amount.as_ref(), "amount")?;
        let amount = non_negative_amount(&RawAmount::from(amount), "amount")?;

        let txn = self.db_pool.begin().await?;
        if TenderEntity::find_by_id(request.tender_id).one(&txn).await?.is_none() {
            return Err(ServiceError::BadRequest("Tender not found".into()));
        }

        let payment = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            tender_id: Set(request.tender_id),
            amount: Set(amount),
            date: Set(request.date.unwrap_or_else(|| Utc::now().date_naive())),
            note: Set(blank_to_none(request.note)),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;
        let status = refresh_payment_status(&txn, payment.tender_id).await?;
        txn.commit().await?;

        info!(payment_id = %payment.id, %status, "Payment recorded");
        Ok(payment)
    }

    #[instrument(skip(self, request), fields(payment_id = %payment_id))]
    pub async fn update_payment(
        &self,
        payment_id: Uuid,
        request: UpdatePaymentRequest,
    ) -> Result<payment::Model, ServiceError> {
        request.validate()?;
        let amount = match request.amount.as_ref() {
            Some(raw) => Some(non_negative_amount(raw, "amount")?),
            None => None,
        };

        let txn = self.db_pool.begin().await?;
        let existing = PaymentEntity::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        let amount = amount.unwrap_or(existing.amount);
        let mut model = existing.into_active_model();
        model.amount = Set(amount);
        if let Some(date) = request.date {
            model.date = Set(date);
        }
        if request.note.is_some() {
            model.note = Set(blank_to_none(request.note));
        }
        let payment = model.update(&txn).await?;
        let status = refresh_payment_status(&txn, payment.tender_id).await?;
        txn.commit().await?;

        info!(payment_id = %payment.id, %status, "Payment updated");
        Ok(payment)
    }

    #[instrument(skip(self))]
    pub async fn delete_payment(&self, payment_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let payment = PaymentEntity::find_by_id(payment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", payment_id)))?;

        PaymentEntity::delete_by_id(payment_id).exec(&txn).await?;
        let status = refresh_payment_status(&txn, payment.tender_id).await?;
        txn.commit().await?;

        info!(payment_id = %payment_id, %status, "Payment deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_payments(&self, tender_id: Uuid) -> Result<Vec<payment::Model>, ServiceError> {
        let db = &*self.db_pool;
        if TenderEntity::find_by_id(tender_id).one(db).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Tender {} not found", tender_id)));
        }
        Ok(PaymentEntity::find()
            .filter(payment::Column::TenderId.eq(tender_id))
            .order_by_desc(payment::Column::Date)
            .order_by_desc(payment::Column::CreatedAt)
            .all(db)
            .await?)
    }

    async fn ensure_tender_no_free(
        &self,
        tender_no: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = TenderEntity::find().filter(tender::Column::TenderNo.eq(tender_no));
        if let Some(id) = except {
            query = query.filter(tender::Column::Id.ne(id));
        }
        if query.one(&*self.db_pool).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Tender number '{}' already exists",
                tender_no
            )));
        }
        Ok(())
    }

    async fn company_names(&self) -> Result<HashMap<Uuid, String>, ServiceError> {
        Ok(CompanyEntity::find()
            .select_only()
            .column(company::Column::Id)
            .column(company::Column::Name)
            .into_tuple::<(Uuid, String)>()
            .all(&*self.db_pool)
            .await?
            .into_iter()
            .collect())
    }

    /// Money figures of every tender
    async fn figures(&self) -> Result<Vec<TenderFigures>, ServiceError> {
        let db = &*self.db_pool;
        let tenders: Vec<(Uuid, Uuid, Decimal, String)> = TenderEntity::find()
            .select_only()
            .column(tender::Column::Id)
            .column(tender::Column::CompanyId)
            .column(tender::Column::TotalValue)
            .column(tender::Column::PaymentStatus)
            .into_tuple()
            .all(db)
            .await?;

        let ids: Vec<Uuid> = tenders.iter().map(|t| t.0).collect();
        let expenses = expense_amounts(db, &ids).await?;
        let payments = payment_amounts(db, &ids).await?;
        let sum = |map: &HashMap<Uuid, Vec<Decimal>>, id: &Uuid| -> Decimal {
            map.get(id).map(|v| v.iter().copied().sum()).unwrap_or(Decimal::ZERO)
        };

        Ok(tenders
            .into_iter()
            .map(|(id, company_id, total_value, status)| TenderFigures {
                company_id,
                total_value,
                total_expenses: sum(&expenses, &id),
                total_paid: sum(&payments, &id),
                stored_status: PaymentStatus::from_str(&status).ok(),
            })
            .collect())
    }

    async fn label_expenses(
        &self,
        expenses: Vec<expense::Model>,
    ) -> Result<Vec<ExpenseRow>, ServiceError> {
        let db = &*self.db_pool;
        let tender_ids: Vec<Uuid> = expenses.iter().map(|e| e.tender_id).collect();
        let tenders: HashMap<Uuid, (String, Uuid)> = if tender_ids.is_empty() {
            HashMap::new()
        } else {
            TenderEntity::find()
                .filter(tender::Column::Id.is_in(tender_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|t| (t.id, (t.tender_no, t.company_id)))
                .collect()
        };
        let companies = self.company_names().await?;

        Ok(expenses
            .into_iter()
            .map(|expense| {
                let (tender_no, company_name) = match tenders.get(&expense.tender_id) {
                    Some((tender_no, company_id)) => (
                        tender_no.clone(),
                        companies.get(company_id).cloned().unwrap_or_default(),
                    ),
                    None => (String::new(), String::new()),
                };
                ExpenseRow {
                    label: expense_label(&tender_no, &company_name),
                    tender_no,
                    company_name,
                    expense,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_filter_accepts_stored_text_and_summary_keys() {
        assert_eq!(
            parse_status_filter("Partially Paid").unwrap(),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(
            parse_status_filter("Partially_Paid").unwrap(),
            PaymentStatus::PartiallyPaid
        );
        assert_eq!(parse_status_filter(" Paid ").unwrap(), PaymentStatus::Paid);
        assert_matches!(
            parse_status_filter("Overdue"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn end_date_may_not_precede_start() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1);
        let end = NaiveDate::from_ymd_opt(2025, 2, 1);
        assert!(check_dates(start, end).is_err());
        assert!(check_dates(end, start).is_ok());
        assert!(check_dates(start, None).is_ok());
    }

    #[test]
    fn expense_label_joins_tender_and_company() {
        assert_eq!(expense_label("T-014", "Acme Ltd"), "T-014 - Acme Ltd");
    }
}
