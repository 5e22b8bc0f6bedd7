use crate::{
    domain::money::to_f64,
    entities::payment,
    errors::ServiceError,
    services::tenders::{CreatePaymentRequest, UpdatePaymentRequest},
    ApiResponse, AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub tender_id: Uuid,
    pub amount: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            tender_id: model.tender_id,
            amount: to_f64(model.amount),
            date: model.date,
            note: model.note,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/payments",
    summary = "Record payment",
    description = "Records a payment and re-derives the tender's payment status in the same transaction",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Unknown tender, missing or malformed amount", body = crate::errors::ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ServiceError> {
    let Json(request) = payload?;
    let payment = state.services.tenders.create_payment(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PaymentResponse::from(payment))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}",
    summary = "Update payment",
    params(("id" = Uuid, Path, description = "Payment ID")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment updated", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Malformed amount", body = crate::errors::ErrorResponse),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdatePaymentRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PaymentResponse>>, ServiceError> {
    let Json(request) = payload?;
    let payment = state.services.tenders.update_payment(id, request).await?;
    Ok(Json(ApiResponse::success(PaymentResponse::from(payment))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    summary = "Delete payment",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Payment not found", body = crate::errors::ErrorResponse),
    ),
    tag = "payments"
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.tenders.delete_payment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
