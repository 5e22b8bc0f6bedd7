use crate::{
    entities::client, errors::ServiceError, services::clients::CreateClientRequest, ApiResponse,
    AppState,
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
pub struct ClientResponse {
    pub id: Uuid,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<client::Model> for ClientResponse {
    fn from(model: client::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            contact_person: model.contact_person,
            phone: model.phone,
            email: model.email,
            address: model.address,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    summary = "List clients",
    responses(
        (status = 200, description = "Clients retrieved", body = ApiResponse<Vec<ClientResponse>>),
    ),
    tag = "clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClientResponse>>>, ServiceError> {
    let clients = state.services.clients.list().await?;
    Ok(Json(ApiResponse::success(
        clients.into_iter().map(ClientResponse::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    summary = "Create client",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", body = ApiResponse<ClientResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
    ),
    tag = "clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ClientResponse>>), ServiceError> {
    let Json(request) = payload?;
    let client = state.services.clients.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ClientResponse::from(client))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    summary = "Get client",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client retrieved", body = ApiResponse<ClientResponse>),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
    ),
    tag = "clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ClientResponse>>, ServiceError> {
    let client = state.services.clients.get(id).await?;
    Ok(Json(ApiResponse::success(ClientResponse::from(client))))
}
