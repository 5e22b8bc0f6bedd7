use crate::{
    domain::money::to_f64,
    entities::project_record,
    errors::ServiceError,
    services::projections::{
        CreateProjectionRequest, ProjectionDashboard, ProjectionFilter, UpdateProjectionRequest,
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
pub struct ProjectionResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company: String,
    pub customer: String,
    pub amount: f64,
    pub project_date: NaiveDate,
    pub status: String,
    pub year: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<project_record::Model> for ProjectionResponse {
    fn from(record: project_record::Model) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            company: record.company,
            customer: record.customer,
            amount: to_f64(record.amount),
            project_date: record.project_date,
            status: record.status,
            year: record.year,
            is_active: record.is_active,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyTotalResponse {
    pub company: String,
    pub total: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectionDashboardResponse {
    pub total_won: f64,
    pub total_lost: f64,
    pub total_pending: f64,
    /// Won amounts per company, largest first
    pub company_totals: Vec<CompanyTotalResponse>,
    pub companies: Vec<String>,
    pub years: Vec<i32>,
    pub records: Vec<ProjectionResponse>,
}

impl From<ProjectionDashboard> for ProjectionDashboardResponse {
    fn from(dashboard: ProjectionDashboard) -> Self {
        Self {
            total_won: to_f64(dashboard.total_won),
            total_lost: to_f64(dashboard.total_lost),
            total_pending: to_f64(dashboard.total_pending),
            company_totals: dashboard
                .company_totals
                .into_iter()
                .map(|t| CompanyTotalResponse {
                    company: t.company,
                    total: to_f64(t.total),
                })
                .collect(),
            companies: dashboard.companies,
            years: dashboard.years,
            records: dashboard
                .records
                .into_iter()
                .map(ProjectionResponse::from)
                .collect(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/projections",
    summary = "List projections",
    description = "Active records, latest project date first",
    params(ProjectionFilter),
    responses(
        (status = 200, description = "Projections retrieved", body = ApiResponse<Vec<ProjectionResponse>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    ),
    tag = "projections"
)]
pub async fn list_projections(
    State(state): State<AppState>,
    query: Result<Query<ProjectionFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<ProjectionResponse>>>, ServiceError> {
    let Query(filter) = query?;
    let records = state.services.projections.list(&filter).await?;
    Ok(Json(ApiResponse::success(
        records.into_iter().map(ProjectionResponse::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/projections/dashboard",
    summary = "Projection dashboard",
    description = "Won and lost totals with won amounts per company over the filtered active records",
    params(ProjectionFilter),
    responses(
        (status = 200, description = "Dashboard computed", body = ApiResponse<ProjectionDashboardResponse>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    ),
    tag = "projections"
)]
pub async fn projection_dashboard(
    State(state): State<AppState>,
    query: Result<Query<ProjectionFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<ProjectionDashboardResponse>>, ServiceError> {
    let Query(filter) = query?;
    let dashboard = state.services.projections.dashboard(&filter).await?;
    Ok(Json(ApiResponse::success(dashboard.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/projections",
    summary = "Record projection",
    request_body = CreateProjectionRequest,
    responses(
        (status = 201, description = "Projection recorded", body = ApiResponse<ProjectionResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    tag = "projections"
)]
pub async fn create_projection(
    State(state): State<AppState>,
    payload: Result<Json<CreateProjectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectionResponse>>), ServiceError> {
    let Json(request) = payload?;
    let record = state.services.projections.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ProjectionResponse::from(record))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/projections/{id}",
    summary = "Get projection",
    params(("id" = Uuid, Path, description = "Projection ID")),
    responses(
        (status = 200, description = "Projection retrieved", body = ApiResponse<ProjectionResponse>),
        (status = 404, description = "Projection not found or archived", body = crate::errors::ErrorResponse),
    ),
    tag = "projections"
)]
pub async fn get_projection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectionResponse>>, ServiceError> {
    let record = state.services.projections.detail(id).await?;
    Ok(Json(ApiResponse::success(ProjectionResponse::from(record))))
}

#[utoipa::path(
    put,
    path = "/api/v1/projections/{id}",
    summary = "Update projection",
    params(("id" = Uuid, Path, description = "Projection ID")),
    request_body = UpdateProjectionRequest,
    responses(
        (status = 200, description = "Projection updated", body = ApiResponse<ProjectionResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Projection not found or archived", body = crate::errors::ErrorResponse),
    ),
    tag = "projections"
)]
pub async fn update_projection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateProjectionRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProjectionResponse>>, ServiceError> {
    let Json(request) = payload?;
    let record = state.services.projections.update(id, request).await?;
    Ok(Json(ApiResponse::success(ProjectionResponse::from(record))))
}

#[utoipa::path(
    post,
    path = "/api/v1/projections/{id}/archive",
    summary = "Archive projection",
    description = "Hides the record from listings and dashboards; the row is kept",
    params(("id" = Uuid, Path, description = "Projection ID")),
    responses(
        (status = 200, description = "Projection archived", body = ApiResponse<ProjectionResponse>),
        (status = 404, description = "Projection not found", body = crate::errors::ErrorResponse),
    ),
    tag = "projections"
)]
pub async fn archive_projection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectionResponse>>, ServiceError> {
    let record = state.services.projections.archive(id).await?;
    Ok(Json(ApiResponse::success(ProjectionResponse::from(record))))
}
