use super::{expenses::ExpenseResponse, payments::PaymentResponse};
use crate::{
    domain::{
        aggregation::{CompanyDashboard, TenderSummary},
        money::to_f64,
        tender::{duration_days, PaymentStatus},
    },
    errors::ServiceError,
    services::tenders::{CreateTenderRequest, TenderDetail, TenderFilter, TenderRow, UpdateTenderRequest},
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
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// A tender with its financials derived at response time
#[derive(Debug, Serialize, ToSchema)]
pub struct TenderResponse {
    pub id: Uuid,
    pub tender_no: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub client_name: String,
    pub total_value: f64,
    pub total_expenses: f64,
    pub total_paid: f64,
    pub balance: f64,
    pub profit: f64,
    pub expense_overrun: f64,
    /// Profit as a percentage of the value; absent for zero-value tenders
    pub profit_margin: Option<f64>,
    pub payment_status: PaymentStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<i64>,
    pub expense_count: u64,
    pub payment_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<TenderRow> for TenderResponse {
    fn from(row: TenderRow) -> Self {
        let f = row.financials;
        Self {
            id: row.tender.id,
            tender_no: row.tender.tender_no,
            company_id: row.tender.company_id,
            company_name: row.company_name,
            client_name: row.tender.client_name,
            total_value: to_f64(f.total_value),
            total_expenses: to_f64(f.total_expenses),
            total_paid: to_f64(f.total_paid),
            balance: to_f64(f.balance),
            profit: to_f64(f.profit),
            expense_overrun: to_f64(f.expense_overrun),
            profit_margin: f.profit_margin().map(to_f64),
            payment_status: f.payment_status,
            start_date: row.tender.start_date,
            end_date: row.tender.end_date,
            duration_days: duration_days(row.tender.start_date, row.tender.end_date),
            expense_count: row.expense_count,
            payment_count: row.payment_count,
            created_at: row.tender.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenderDetailResponse {
    #[serde(flatten)]
    pub tender: TenderResponse,
    pub expenses: Vec<ExpenseResponse>,
    pub payments: Vec<PaymentResponse>,
}

impl From<TenderDetail> for TenderDetailResponse {
    fn from(detail: TenderDetail) -> Self {
        Self {
            tender: TenderResponse::from(detail.row),
            expenses: detail.expenses.into_iter().map(ExpenseResponse::from).collect(),
            payments: detail.payments.into_iter().map(PaymentResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCountsResponse {
    #[serde(rename = "Pending")]
    pub pending: u64,
    #[serde(rename = "Partially_Paid")]
    pub partially_paid: u64,
    #[serde(rename = "Paid")]
    pub paid: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenderSummaryResponse {
    pub total_tenders: u64,
    pub total_companies: u64,
    pub total_expenses: f64,
    pub total_tender_value: f64,
    pub total_paid: f64,
    pub total_profit: f64,
    pub status_counts: StatusCountsResponse,
}

impl From<TenderSummary> for TenderSummaryResponse {
    fn from(summary: TenderSummary) -> Self {
        Self {
            total_tenders: summary.total_tenders,
            total_companies: summary.total_companies,
            total_expenses: to_f64(summary.total_expenses),
            total_tender_value: to_f64(summary.total_tender_value),
            total_paid: to_f64(summary.total_paid),
            total_profit: to_f64(summary.total_profit),
            status_counts: StatusCountsResponse {
                pending: summary.status_counts.pending,
                partially_paid: summary.status_counts.partially_paid,
                paid: summary.status_counts.paid,
            },
        }
    }
}

/// Parallel arrays, one slot per company in name order
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyDashboardResponse {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub paids: Vec<f64>,
    pub expenses: Vec<f64>,
    pub profits: Vec<f64>,
    pub overruns: Vec<f64>,
}

fn floats(values: Vec<Decimal>) -> Vec<f64> {
    values.into_iter().map(to_f64).collect()
}

impl From<CompanyDashboard> for CompanyDashboardResponse {
    fn from(dashboard: CompanyDashboard) -> Self {
        Self {
            labels: dashboard.labels,
            values: floats(dashboard.values),
            paids: floats(dashboard.paids),
            expenses: floats(dashboard.expenses),
            profits: floats(dashboard.profits),
            overruns: floats(dashboard.overruns),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/tenders",
    summary = "List tenders",
    description = "Newest first, each with balance, profit, overrun and payment status derived from current expenses and payments",
    params(TenderFilter),
    responses(
        (status = 200, description = "Tenders retrieved", body = ApiResponse<Vec<TenderResponse>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    ),
    tag = "tenders"
)]
pub async fn list_tenders(
    State(state): State<AppState>,
    query: Result<Query<TenderFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<TenderResponse>>>, ServiceError> {
    let Query(filter) = query?;
    let rows = state.services.tenders.list(&filter).await?;
    Ok(Json(ApiResponse::success(
        rows.into_iter().map(TenderResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/tenders",
    summary = "Create tender",
    request_body = CreateTenderRequest,
    responses(
        (status = 201, description = "Tender created", body = ApiResponse<TenderDetailResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tender number already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "tenders"
)]
pub async fn create_tender(
    State(state): State<AppState>,
    payload: Result<Json<CreateTenderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TenderDetailResponse>>), ServiceError> {
    let Json(request) = payload?;
    let detail = state.services.tenders.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TenderDetailResponse::from(detail))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenders/summary",
    summary = "Tender summary",
    responses(
        (status = 200, description = "Portfolio totals and status counts", body = ApiResponse<TenderSummaryResponse>),
    ),
    tag = "tenders"
)]
pub async fn tender_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TenderSummaryResponse>>, ServiceError> {
    let summary = state.services.tenders.summary().await?;
    Ok(Json(ApiResponse::success(summary.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenders/by-company",
    summary = "Tender figures by company",
    responses(
        (status = 200, description = "Parallel arrays per company", body = ApiResponse<CompanyDashboardResponse>),
    ),
    tag = "tenders"
)]
pub async fn tenders_by_company(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CompanyDashboardResponse>>, ServiceError> {
    let dashboard = state.services.tenders.by_company().await?;
    Ok(Json(ApiResponse::success(dashboard.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenders/{id}",
    summary = "Get tender",
    params(("id" = Uuid, Path, description = "Tender ID")),
    responses(
        (status = 200, description = "Tender with expenses and payments", body = ApiResponse<TenderDetailResponse>),
        (status = 404, description = "Tender not found", body = crate::errors::ErrorResponse),
    ),
    tag = "tenders"
)]
pub async fn get_tender(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TenderDetailResponse>>, ServiceError> {
    let detail = state.services.tenders.get(id).await?;
    Ok(Json(ApiResponse::success(TenderDetailResponse::from(detail))))
}

#[utoipa::path(
    put,
    path = "/api/v1/tenders/{id}",
    summary = "Update tender",
    description = "A new total value re-derives the stored payment status",
    params(("id" = Uuid, Path, description = "Tender ID")),
    request_body = UpdateTenderRequest,
    responses(
        (status = 200, description = "Tender updated", body = ApiResponse<TenderDetailResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Tender not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tender number already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "tenders"
)]
pub async fn update_tender(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTenderRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TenderDetailResponse>>, ServiceError> {
    let Json(request) = payload?;
    let detail = state.services.tenders.update(id, request).await?;
    Ok(Json(ApiResponse::success(TenderDetailResponse::from(detail))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tenders/{id}",
    summary = "Delete tender",
    params(("id" = Uuid, Path, description = "Tender ID")),
    responses(
        (status = 204, description = "Tender, expenses and payments deleted"),
        (status = 404, description = "Tender not found", body = crate::errors::ErrorResponse),
    ),
    tag = "tenders"
)]
pub async fn delete_tender(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.tenders.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/tenders/{id}/payments",
    summary = "List tender payments",
    params(("id" = Uuid, Path, description = "Tender ID")),
    responses(
        (status = 200, description = "Payments, newest first", body = ApiResponse<Vec<PaymentResponse>>),
        (status = 404, description = "Tender not found", body = crate::errors::ErrorResponse),
    ),
    tag = "tenders"
)]
pub async fn list_tender_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PaymentResponse>>>, ServiceError> {
    let payments = state.services.tenders.list_payments(id).await?;
    Ok(Json(ApiResponse::success(
        payments.into_iter().map(PaymentResponse::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregation::StatusCounts;
    use rust_decimal_macros::dec;

    #[test]
    fn summary_status_counts_use_underscored_keys() {
        let summary = TenderSummary {
            total_tenders: 3,
            total_companies: 1,
            total_expenses: dec!(10),
            total_tender_value: dec!(300),
            total_paid: dec!(150),
            total_profit: dec!(290),
            status_counts: StatusCounts {
                pending: 1,
                partially_paid: 1,
                paid: 1,
            },
        };
        let json = serde_json::to_value(TenderSummaryResponse::from(summary)).unwrap();
        assert_eq!(json["status_counts"]["Partially_Paid"], 1);
        assert_eq!(json["status_counts"]["Pending"], 1);
        assert_eq!(json["total_profit"], 290.0);
    }
}
