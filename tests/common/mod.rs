use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use bizdesk_api::{
    build_router,
    config::AppConfig,
    db,
    errors::ServiceError,
    handlers::AppServices,
    render::{PdfEngine, TemplateRenderer},
    AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Marker every fake PDF starts with
#[allow(dead_code)]
pub const FAKE_PDF_PREFIX: &[u8] = b"%PDF-fake\n";

/// Stands in for the external converter: echoes the HTML behind a PDF marker
pub struct EchoPdfEngine;

#[async_trait]
impl PdfEngine for EchoPdfEngine {
    async fn html_to_pdf(&self, html: &str) -> Result<Vec<u8>, ServiceError> {
        let mut bytes = FAKE_PDF_PREFIX.to_vec();
        bytes.extend_from_slice(html.as_bytes());
        Ok(bytes)
    }
}

/// Application wired against a throwaway SQLite file and the bundled templates
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Same as `new`, with a chance to adjust the configuration first
    pub async fn with_config<F>(adjust: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("bizdesk_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.template_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/templates").to_string();
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let renderer =
            TemplateRenderer::from_dir(&cfg.template_dir, &cfg.currency_major, &cfg.currency_minor)
                .expect("bundled templates load");

        let db_arc = Arc::new(pool);
        let services = AppServices::with_rendering(
            db_arc.clone(),
            &cfg,
            Arc::new(renderer),
            Arc::new(EchoPdfEngine),
        );

        let state = AppState {
            db: db_arc,
            config: cfg,
            services,
        };

        Self {
            router: build_router(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a body verbatim, for malformed JSON
    #[allow(dead_code)]
    pub async fn request_raw(&self, method: Method, uri: &str, body: &'static str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    #[allow(dead_code)]
    pub async fn create_company(&self, name: &str, slug: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/companies",
                Some(json!({ "name": name, "slug": slug })),
            )
            .await;
        assert_eq!(response.status(), 201, "company creation failed");
        body_json(response).await["data"].clone()
    }

    #[allow(dead_code)]
    pub async fn create_tender(&self, company_id: &str, tender_no: &str, total_value: Value) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/v1/tenders",
                Some(json!({
                    "tender_no": tender_no,
                    "company_id": company_id,
                    "client_name": "Ministry of Works",
                    "total_value": total_value,
                    "start_date": "2025-01-01",
                    "end_date": "2025-03-31"
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "tender creation failed");
        body_json(response).await["data"].clone()
    }
}

#[allow(dead_code)]
pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("response is json")
}
