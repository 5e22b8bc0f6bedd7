mod common;

use std::collections::HashSet;

use axum::http::{header, Method, StatusCode};
use chrono::{Datelike, Utc};
use futures::future::join_all;
use serde_json::{json, Value};

use common::{body_bytes, body_json, TestApp, FAKE_PDF_PREFIX};

fn paper_payload(company_id: &str, client_name: &str) -> Value {
    json!({
        "company_id": company_id,
        "client": { "name": client_name, "phone": "+260 977 000000" },
        "date": "2025-02-10",
        "tax_percentage": 16,
        "prepared_by": "Mary",
        "items": [
            { "description": "Cement 50kg", "quantity": 2, "unit_price": "1500" },
            { "description": "Delivery", "quantity": "1", "unit_price": 500 }
        ]
    })
}

async fn create_paper(app: &TestApp, company_id: &str, client_name: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/papers",
            Some(paper_payload(company_id, client_name)),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn documents_are_numbered_per_company_and_year() {
    let app = TestApp::new().await;
    let acme = app.create_company("Acme Trading", "acme").await;
    let zed = app.create_company("Zed Supplies", "zed").await;
    let acme_id = acme["id"].as_str().unwrap();
    let zed_id = zed["id"].as_str().unwrap();
    let year = Utc::now().year();

    let first = create_paper(&app, acme_id, "Lusaka Builders").await;
    let second = create_paper(&app, acme_id, "Kitwe Hardware").await;
    let other = create_paper(&app, zed_id, "Ndola Mills").await;
    let third = create_paper(&app, acme_id, "Lusaka Builders").await;

    assert_eq!(first["paper_number"], format!("ACME/{year}/0001"));
    assert_eq!(second["paper_number"], format!("ACME/{year}/0002"));
    assert_eq!(other["paper_number"], format!("ZED/{year}/0001"));
    assert_eq!(third["paper_number"], format!("ACME/{year}/0003"));

    // Readers see the stored suffix shifted by the display offset
    assert_eq!(first["display_number"], "0100");
    assert_eq!(third["display_number"], "0102");
}

#[tokio::test]
async fn totals_are_derived_from_items_and_tax() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let paper = create_paper(&app, company["id"].as_str().unwrap(), "Lusaka Builders").await;

    assert_eq!(paper["subtotal"], 3500.0);
    assert_eq!(paper["tax_amount"], 560.0);
    assert_eq!(paper["total"], 4060.0);
    assert_eq!(paper["items"].as_array().unwrap().len(), 2);
    assert_eq!(paper["items"][0]["amount"], 3000.0);
    assert_eq!(paper["items"][0]["position"], 0);
    assert_eq!(paper["client"]["name"], "Lusaka Builders");

    let id = paper["id"].as_str().unwrap();
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/papers/{id}/items"),
            Some(json!({
                "items": [{ "description": "Steel bar", "quantity": 4, "unit_price": 250 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let replaced = body_json(response).await["data"].clone();
    assert_eq!(replaced["subtotal"], 1000.0);
    assert_eq!(replaced["tax_amount"], 160.0);
    assert_eq!(replaced["total"], 1160.0);
    assert_eq!(replaced["paper_number"], paper["paper_number"]);

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/papers/{id}"),
            Some(json!({ "tax_percentage": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let untaxed = body_json(response).await["data"].clone();
    assert_eq!(untaxed["tax_amount"], 0.0);
    assert_eq!(untaxed["total"], 1000.0);
}

#[tokio::test]
async fn concurrent_creation_never_reuses_a_number() {
    // A real pool, so the requests race for the write lock
    let app = TestApp::with_config(|cfg| {
        cfg.db_max_connections = 8;
        cfg.numbering_max_attempts = 20;
    })
    .await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap().to_string();

    let requests = (0..8).map(|i| {
        let payload = paper_payload(&company_id, &format!("Client {i}"));
        app.request(Method::POST, "/api/v1/papers", Some(payload))
    });
    let responses = join_all(requests).await;

    let mut numbers = HashSet::new();
    for response in responses {
        assert_eq!(response.status(), StatusCode::CREATED);
        let paper = body_json(response).await;
        numbers.insert(paper["data"]["paper_number"].as_str().unwrap().to_string());
    }
    assert_eq!(numbers.len(), 8);

    let year = Utc::now().year();
    let expected: HashSet<String> = (1..=8).map(|n| format!("ACME/{year}/{n:04}")).collect();
    assert_eq!(numbers, expected);
}

#[tokio::test]
async fn deleted_numbers_are_not_handed_out_again() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();
    let year = Utc::now().year();

    create_paper(&app, company_id, "Lusaka Builders").await;
    let second = create_paper(&app, company_id, "Kitwe Hardware").await;
    create_paper(&app, company_id, "Ndola Mills").await;

    let second_id = second["id"].as_str().unwrap();
    let response = app
        .request(Method::DELETE, &format!("/api/v1/papers/{second_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let fourth = create_paper(&app, company_id, "Lusaka Builders").await;
    assert_eq!(fourth["paper_number"], format!("ACME/{year}/0004"));
}

#[tokio::test]
async fn a_reused_slug_skips_numbers_its_old_owner_holds() {
    let app = TestApp::new().await;
    let old_owner = app.create_company("Acme Trading", "acme").await;
    let old_owner_id = old_owner["id"].as_str().unwrap();
    let year = Utc::now().year();

    create_paper(&app, old_owner_id, "Lusaka Builders").await;
    create_paper(&app, old_owner_id, "Kitwe Hardware").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/companies/{old_owner_id}"),
            Some(json!({ "slug": "acme-old" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let new_owner = app.create_company("Acme Holdings", "acme").await;
    let new_owner_id = new_owner["id"].as_str().unwrap();

    let first = create_paper(&app, new_owner_id, "Ndola Mills").await;
    assert_eq!(first["paper_number"], format!("ACME/{year}/0003"));
    let second = create_paper(&app, new_owner_id, "Ndola Mills").await;
    assert_eq!(second["paper_number"], format!("ACME/{year}/0004"));

    // The renamed company keeps counting under its new slug
    let renamed = create_paper(&app, old_owner_id, "Lusaka Builders").await;
    assert_eq!(renamed["paper_number"], format!("ACME-OLD/{year}/0003"));
}

#[tokio::test]
async fn malformed_amounts_and_missing_clients_are_rejected() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();

    let response = app
        .request(
            Method::POST,
            "/api/v1/papers",
            Some(json!({
                "company_id": company_id,
                "client": { "name": "Lusaka Builders", "phone": "0977" },
                "items": [{ "description": "Cement", "quantity": 1, "unit_price": "cheap" }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("unit_price"));

    let response = app
        .request(
            Method::POST,
            "/api/v1/papers",
            Some(json!({
                "company_id": company_id,
                "items": [{ "description": "Cement", "quantity": 1, "unit_price": 10 }]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_raw(Method::POST, "/api/v1/papers", "{\"company_id\": ")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_by_text_and_paginates() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();
    for client in ["Lusaka Builders", "Kitwe Hardware", "Lusaka Mills"] {
        create_paper(&app, company_id, client).await;
    }

    let response = app.request(Method::GET, "/api/v1/papers?q=lusaka", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    let response = app
        .request(Method::GET, "/api/v1/papers?page=2&per_page=2", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn preview_and_pdf_show_the_display_number() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();
    create_paper(&app, company_id, "First").await;
    create_paper(&app, company_id, "Second").await;
    let paper = create_paper(&app, company_id, "Lusaka Builders").await;
    let id = paper["id"].as_str().unwrap();

    let response = app
        .request(Method::GET, &format!("/api/v1/papers/{id}/preview/invoice"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("Invoice"));
    assert!(html.contains("0102"));
    assert!(html.contains("4,060.00"));
    assert!(html.contains("Lusaka Builders"));

    let response = app
        .request(Method::GET, &format!("/api/v1/papers/{id}/pdf/delivery_note"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"delivery_note_ACME_0102.pdf\""
    );
    let bytes = body_bytes(response).await;
    assert!(bytes.starts_with(FAKE_PDF_PREFIX));

    let response = app
        .request(Method::GET, &format!("/api/v1/papers/{id}/preview/receipt"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_company_removes_its_documents() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();
    let paper = create_paper(&app, company_id, "Lusaka Builders").await;
    let id = paper["id"].as_str().unwrap();

    let response = app
        .request(Method::DELETE, &format!("/api/v1/companies/{company_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/v1/papers/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_documents_are_gone() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let paper = create_paper(&app, company["id"].as_str().unwrap(), "Lusaka Builders").await;
    let id = paper["id"].as_str().unwrap();

    let response = app
        .request(Method::DELETE, &format!("/api/v1/papers/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/papers/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
