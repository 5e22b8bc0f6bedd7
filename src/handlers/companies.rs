use crate::{
    domain::money::to_f64,
    entities::company,
    errors::ServiceError,
    services::companies::{CompanyOverview, CreateCompanyRequest, UpdateCompanyRequest},
    ApiResponse, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tender_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tender_value: Option<f64>,
}

impl From<company::Model> for CompanyResponse {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            logo: model.logo,
            address: model.address,
            phone: model.phone,
            email: model.email,
            created_at: model.created_at,
            tender_count: None,
            total_tender_value: None,
        }
    }
}

impl From<CompanyOverview> for CompanyResponse {
    fn from(overview: CompanyOverview) -> Self {
        Self {
            tender_count: Some(overview.tender_count),
            total_tender_value: Some(to_f64(overview.total_tender_value)),
            ..Self::from(overview.company)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/companies",
    summary = "List companies",
    description = "All companies by name, with their tender count and value",
    responses(
        (status = 200, description = "Companies retrieved", body = ApiResponse<Vec<CompanyResponse>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CompanyResponse>>>, ServiceError> {
    let companies = state.services.companies.list().await?;
    Ok(Json(ApiResponse::success(
        companies.into_iter().map(CompanyResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/companies",
    summary = "Create company",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = ApiResponse<CompanyResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::errors::ErrorResponse),
    ),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    payload: Result<Json<CreateCompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CompanyResponse>>), ServiceError> {
    let Json(request) = payload?;
    let company = state.services.companies.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CompanyResponse::from(company))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/companies/{id}",
    summary = "Get company",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company retrieved", body = ApiResponse<CompanyResponse>),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CompanyResponse>>, ServiceError> {
    let company = state.services.companies.get(id).await?;
    Ok(Json(ApiResponse::success(CompanyResponse::from(company))))
}

#[utoipa::path(
    put,
    path = "/api/v1/companies/{id}",
    summary = "Update company",
    params(("id" = Uuid, Path, description = "Company ID")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = ApiResponse<CompanyResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::errors::ErrorResponse),
    ),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCompanyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CompanyResponse>>, ServiceError> {
    let Json(request) = payload?;
    let company = state.services.companies.update(id, request).await?;
    Ok(Json(ApiResponse::success(CompanyResponse::from(company))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/companies/{id}",
    summary = "Delete company",
    description = "Deletes the company with its documents, tenders, expenses and payments",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 204, description = "Company deleted"),
        (status = 404, description = "Company not found", body = crate::errors::ErrorResponse),
    ),
    tag = "companies"
)]
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.companies.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
