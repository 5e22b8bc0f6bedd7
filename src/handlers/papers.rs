use super::{
    clients::ClientResponse,
    common::{paginated, PaginationParams},
};
use crate::{
    domain::money::to_f64,
    entities::paper_item,
    errors::ServiceError,
    services::papers::{
        CreatePaperRequest, PaperDetail, PaperListFilter, PaperRow, ReplaceItemsRequest,
        UpdatePaperRequest,
    },
    ApiResponse, AppState, PaginatedResponse,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct PaperItemResponse {
    pub id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

impl From<paper_item::Model> for PaperItemResponse {
    fn from(item: paper_item::Model) -> Self {
        Self {
            id: item.id,
            position: item.position,
            description: item.description,
            quantity: to_f64(item.quantity),
            unit_price: to_f64(item.unit_price),
            amount: to_f64(item.amount),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaperResponse {
    pub id: Uuid,
    /// Stored identifier, `{SLUG}/{YEAR}/{NNNN}`
    pub paper_number: String,
    /// Sequence shown to readers
    pub display_number: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub company_slug: String,
    pub client: ClientResponse,
    pub date: NaiveDate,
    pub tax_percentage: f64,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub prepared_by: Option<String>,
    pub delivered_by: Option<String>,
    pub received_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PaperItemResponse>,
}

impl From<PaperDetail> for PaperResponse {
    fn from(detail: PaperDetail) -> Self {
        let entry = detail.entry;
        Self {
            id: entry.id,
            paper_number: entry.paper_number,
            display_number: detail.display_number,
            company_id: detail.company.id,
            company_name: detail.company.name,
            company_slug: detail.company.slug,
            client: ClientResponse::from(detail.client),
            date: entry.date,
            tax_percentage: to_f64(entry.tax_percentage),
            subtotal: to_f64(entry.subtotal),
            tax_amount: to_f64(entry.tax_amount),
            total: to_f64(entry.total),
            prepared_by: entry.prepared_by,
            delivered_by: entry.delivered_by,
            received_by: entry.received_by,
            created_at: entry.created_at,
            items: detail.items.into_iter().map(PaperItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaperSummaryResponse {
    pub id: Uuid,
    pub paper_number: String,
    pub display_number: String,
    pub company_id: Uuid,
    pub company_name: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub date: NaiveDate,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

impl From<PaperRow> for PaperSummaryResponse {
    fn from(row: PaperRow) -> Self {
        Self {
            id: row.entry.id,
            paper_number: row.entry.paper_number,
            display_number: row.display_number,
            company_id: row.entry.company_id,
            company_name: row.company_name,
            client_id: row.entry.client_id,
            client_name: row.client_name,
            date: row.entry.date,
            total: to_f64(row.entry.total),
            created_at: row.entry.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaperListQuery {
    pub company_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    /// Matches the number, the client name or the company name
    pub q: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaperListQuery {
    fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/papers",
    summary = "List documents",
    description = "Newest first, filtered by company, client and free text",
    params(PaperListQuery),
    responses(
        (status = 200, description = "Documents retrieved", body = ApiResponse<PaginatedResponse<PaperSummaryResponse>>),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn list_papers(
    State(state): State<AppState>,
    query: Result<Query<PaperListQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<PaginatedResponse<PaperSummaryResponse>>>, ServiceError> {
    let Query(query) = query?;
    let (page, per_page) = query.pagination().normalized();
    let result = state
        .services
        .papers
        .list(PaperListFilter {
            company_id: query.company_id,
            client_id: query.client_id,
            q: query.q,
            page,
            per_page,
        })
        .await?;

    let items = result
        .rows
        .into_iter()
        .map(PaperSummaryResponse::from)
        .collect();
    Ok(Json(ApiResponse::success(paginated(
        items,
        result.total,
        page,
        per_page,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/papers",
    summary = "Create document",
    description = "Creates a document with its items; the number is assigned once, here",
    request_body = CreatePaperRequest,
    responses(
        (status = 201, description = "Document created", body = ApiResponse<PaperResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Numbering conflict persisted after retries", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn create_paper(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaperRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PaperResponse>>), ServiceError> {
    let Json(request) = payload?;
    let detail = state.services.papers.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PaperResponse::from(detail))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/papers/{id}",
    summary = "Get document",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document retrieved", body = ApiResponse<PaperResponse>),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn get_paper(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaperResponse>>, ServiceError> {
    let detail = state.services.papers.get(id).await?;
    Ok(Json(ApiResponse::success(PaperResponse::from(detail))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/papers/{id}",
    summary = "Update document header",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = UpdatePaperRequest,
    responses(
        (status = 200, description = "Document updated", body = ApiResponse<PaperResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn update_paper(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePaperRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PaperResponse>>, ServiceError> {
    let Json(request) = payload?;
    let detail = state.services.papers.update(id, request).await?;
    Ok(Json(ApiResponse::success(PaperResponse::from(detail))))
}

#[utoipa::path(
    put,
    path = "/api/v1/papers/{id}/items",
    summary = "Replace document items",
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = ReplaceItemsRequest,
    responses(
        (status = 200, description = "Items replaced, totals recomputed", body = ApiResponse<PaperResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn replace_paper_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ReplaceItemsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PaperResponse>>, ServiceError> {
    let Json(request) = payload?;
    let detail = state.services.papers.replace_items(id, request).await?;
    Ok(Json(ApiResponse::success(PaperResponse::from(detail))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/papers/{id}",
    summary = "Delete document",
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document and items deleted"),
        (status = 404, description = "Document not found", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn delete_paper(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.papers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/papers/{id}/preview/{paper_type}",
    summary = "Preview document",
    params(
        ("id" = Uuid, Path, description = "Document ID"),
        ("paper_type" = String, Path, description = "quotation, invoice or delivery_note"),
    ),
    responses(
        (status = 200, description = "Rendered HTML", content_type = "text/html", body = String),
        (status = 404, description = "Document or paper type not found", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn preview_paper(
    State(state): State<AppState>,
    Path((id, paper_type)): Path<(Uuid, String)>,
) -> Result<Html<String>, ServiceError> {
    let html = state.services.papers.preview(id, &paper_type).await?;
    Ok(Html(html))
}

#[utoipa::path(
    get,
    path = "/api/v1/papers/{id}/pdf/{paper_type}",
    summary = "Export document as PDF",
    params(
        ("id" = Uuid, Path, description = "Document ID"),
        ("paper_type" = String, Path, description = "quotation, invoice or delivery_note"),
    ),
    responses(
        (status = 200, description = "PDF attachment", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Document or paper type not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "PDF rendering failed", body = crate::errors::ErrorResponse),
    ),
    tag = "papers"
)]
pub async fn export_paper_pdf(
    State(state): State<AppState>,
    Path((id, paper_type)): Path<(Uuid, String)>,
) -> Result<Response, ServiceError> {
    let pdf = state.services.papers.pdf(id, &paper_type).await?;
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", pdf.filename))
        .map_err(|e| ServiceError::InternalError(format!("invalid filename header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf.bytes,
    )
        .into_response())
}
