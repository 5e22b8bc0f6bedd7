//! BizDesk API library
//!
//! Numbered commercial documents, sales projections and tender tracking
//! behind one HTTP API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod openapi;
pub mod render;
pub mod services;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use utoipa::ToSchema;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        assert!(!response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }

    #[test]
    fn metadata_is_absent_request_id_outside_a_request() {
        let response = ApiResponse::success(1);
        let meta = response.meta.expect("metadata expected");
        assert!(meta.request_id.is_none());
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{clients, companies, expenses, papers, payments, projections, tenders};

    Router::new()
        // Companies
        .route(
            "/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route(
            "/companies/:id",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        // Clients
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route("/clients/:id", get(clients::get_client))
        // Papers
        .route("/papers", get(papers::list_papers).post(papers::create_paper))
        .route(
            "/papers/:id",
            get(papers::get_paper)
                .patch(papers::update_paper)
                .delete(papers::delete_paper),
        )
        .route("/papers/:id/items", put(papers::replace_paper_items))
        .route(
            "/papers/:id/preview/:paper_type",
            get(papers::preview_paper),
        )
        .route("/papers/:id/pdf/:paper_type", get(papers::export_paper_pdf))
        // Projections
        .route(
            "/projections",
            get(projections::list_projections).post(projections::create_projection),
        )
        .route(
            "/projections/dashboard",
            get(projections::projection_dashboard),
        )
        .route(
            "/projections/:id",
            get(projections::get_projection).put(projections::update_projection),
        )
        .route(
            "/projections/:id/archive",
            post(projections::archive_projection),
        )
        // Tenders
        .route(
            "/tenders",
            get(tenders::list_tenders).post(tenders::create_tender),
        )
        .route("/tenders/summary", get(tenders::tender_summary))
        .route("/tenders/by-company", get(tenders::tenders_by_company))
        .route(
            "/tenders/:id",
            get(tenders::get_tender)
                .put(tenders::update_tender)
                .delete(tenders::delete_tender),
        )
        .route("/tenders/:id/payments", get(tenders::list_tender_payments))
        // Expenses
        .route(
            "/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route("/expenses/feed", get(expenses::expense_feed))
        .route(
            "/expenses/:id",
            put(expenses::update_expense).delete(expenses::delete_expense),
        )
        // Payments
        .route("/payments", post(payments::create_payment))
        .route(
            "/payments/:id",
            put(payments::update_payment).delete(payments::delete_payment),
        )
}

/// Explicit origins when configured; permissive outside production otherwise
fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect()
        })
        .unwrap_or_default();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if config.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::permissive()
    }
}

/// The full application: health probe, `/api/v1`, Swagger UI and the
/// request id, tracing, CORS and compression layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api_v1_routes())
        .with_state(state)
        .merge(openapi::swagger_ui())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
}
