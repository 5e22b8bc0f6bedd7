use super::common::total_pages;
use crate::{
    domain::money::to_f64,
    entities::expense,
    errors::ServiceError,
    services::tenders::{
        CreateExpenseRequest, ExpenseFilter, ExpensePage, ExpenseRow, UpdateExpenseRequest,
    },
    ApiResponse, AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub category: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<expense::Model> for ExpenseResponse {
    fn from(model: expense::Model) -> Self {
        Self {
            id: model.id,
            tender_id: model.tender_id,
            category: model.category,
            description: model.description,
            amount: to_f64(model.amount),
            date: model.date,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseRowResponse {
    #[serde(flatten)]
    pub expense: ExpenseResponse,
    pub tender_no: String,
    pub company_name: String,
    /// `"{tender_no} - {company}"`
    pub label: String,
}

impl From<ExpenseRow> for ExpenseRowResponse {
    fn from(row: ExpenseRow) -> Self {
        Self {
            expense: ExpenseResponse::from(row.expense),
            tender_no: row.tender_no,
            company_name: row.company_name,
            label: row.label,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExpensePageResponse {
    pub items: Vec<ExpenseRowResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    /// Sum over every matching expense, not just this page
    pub total_amount: f64,
}

impl From<ExpensePage> for ExpensePageResponse {
    fn from(page: ExpensePage) -> Self {
        Self {
            items: page.rows.into_iter().map(ExpenseRowResponse::from).collect(),
            total: page.total,
            page: page.page,
            limit: page.per_page,
            total_pages: total_pages(page.total, page.per_page),
            total_amount: to_f64(page.total_amount),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    summary = "List expenses",
    description = "Newest first, filtered by company and tender, one page at a time",
    params(ExpenseFilter),
    responses(
        (status = 200, description = "Expenses retrieved", body = ApiResponse<ExpensePageResponse>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    ),
    tag = "expenses"
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    query: Result<Query<ExpenseFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<ExpensePageResponse>>, ServiceError> {
    let Query(filter) = query?;
    let page = state.services.tenders.list_expenses(&filter).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/expenses/feed",
    summary = "Expense feed",
    description = "The latest expenses, each labelled with its tender and company",
    responses(
        (status = 200, description = "Expenses retrieved", body = ApiResponse<Vec<ExpenseRowResponse>>),
    ),
    tag = "expenses"
)]
pub async fn expense_feed(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ExpenseRowResponse>>>, ServiceError> {
    let rows = state.services.tenders.expense_feed().await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(ExpenseRowResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    summary = "Record expense",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense recorded", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Unknown tender, missing or malformed amount", body = crate::errors::ErrorResponse),
    ),
    tag = "expenses"
)]
pub async fn create_expense(
    State(state): State<AppState>,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), ServiceError> {
    let Json(request) = payload?;
    let expense = state.services.tenders.create_expense(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ExpenseResponse::from(expense))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/expenses/{id}",
    summary = "Update expense",
    params(("id" = Uuid, Path, description = "Expense ID")),
    request_body = UpdateExpenseRequest,
    responses(
        (status = 200, description = "Expense updated", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse),
    ),
    tag = "expenses"
)]
pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ServiceError> {
    let Json(request) = payload?;
    let expense = state.services.tenders.update_expense(id, request).await?;
    Ok(Json(ApiResponse::success(ExpenseResponse::from(expense))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/expenses/{id}",
    summary = "Delete expense",
    params(("id" = Uuid, Path, description = "Expense ID")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found", body = crate::errors::ErrorResponse),
    ),
    tag = "expenses"
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.tenders.delete_expense(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
