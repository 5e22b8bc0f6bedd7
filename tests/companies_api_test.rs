mod common;

use axum::http::{Method, StatusCode};
use bizdesk_api::entities::paper_item;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use common::{body_json, TestApp};

#[allow(dead_code)]
fn assert_app_state_bounds() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<bizdesk_api::AppState>();
}

#[tokio::test]
async fn health_reports_the_database() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = body_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn companies_list_with_tender_totals() {
    let app = TestApp::new().await;
    let zed = app.create_company("Zed Supplies", "zed").await;
    app.create_company("Acme Trading", "acme").await;
    app.create_tender(zed["id"].as_str().unwrap(), "Z-1", json!(1500))
        .await;

    let response = app.request(Method::GET, "/api/v1/companies", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let companies = body_json(response).await["data"].clone();
    assert_eq!(companies[0]["name"], "Acme Trading");
    assert_eq!(companies[0]["tender_count"], 0);
    assert_eq!(companies[1]["name"], "Zed Supplies");
    assert_eq!(companies[1]["tender_count"], 1);
    assert_eq!(companies[1]["total_tender_value"], 1500.0);
}

#[tokio::test]
async fn company_slugs_are_validated_and_unique() {
    let app = TestApp::new().await;
    app.create_company("Acme Trading", "acme").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "name": "Acme Again", "slug": "acme" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::POST,
            "/api/v1/companies",
            Some(json!({ "name": "Bad Slug", "slug": "Not A Slug" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn company_update_and_missing_records() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let id = company["id"].as_str().unwrap();

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/companies/{id}"),
            Some(json!({ "address": "Plot 12, Cairo Road" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["address"], "Plot 12, Cairo Road");
    assert_eq!(updated["slug"], "acme");

    let missing = uuid::Uuid::new_v4();
    let response = app
        .request(Method::GET, &format!("/api/v1/companies/{missing}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clients_can_be_created_and_listed() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/clients",
            Some(json!({
                "name": "Lusaka Builders",
                "contact_person": "J. Banda",
                "phone": "+260 211 000000"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let client = body_json(response).await["data"].clone();
    let id = client["id"].as_str().unwrap();

    let response = app
        .request(Method::GET, &format!("/api/v1/clients/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["contact_person"], "J. Banda");

    let response = app
        .request(
            Method::POST,
            "/api/v1/clients",
            Some(json!({ "name": "No Phone", "phone": "" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.request(Method::GET, "/api/v1/clients", None).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_company_removes_everything_it_owns() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();
    let survivor = app.create_company("Zed Supplies", "zed").await;
    let survivor_tender = app
        .create_tender(survivor["id"].as_str().unwrap(), "Z-1", json!(800))
        .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/papers",
            Some(json!({
                "company_id": company_id,
                "client": { "name": "Lusaka Builders", "phone": "+260 977 000000" },
                "items": [
                    { "description": "Cement 50kg", "quantity": 2, "unit_price": 150 },
                    { "description": "Delivery", "quantity": 1, "unit_price": 50 }
                ]
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let paper_id: uuid::Uuid = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let tender = app.create_tender(company_id, "A-1", json!(1000)).await;
    let tender_id = tender["id"].as_str().unwrap();
    for (path, body) in [
        (
            "/api/v1/expenses",
            json!({ "tender_id": tender_id, "category": "Fuel", "amount": 40, "date": "2025-01-02" }),
        ),
        (
            "/api/v1/payments",
            json!({ "tender_id": tender_id, "amount": 300, "date": "2025-01-03" }),
        ),
    ] {
        let response = app.request(Method::POST, path, Some(body)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let response = app
        .request(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({
                "tender_id": survivor_tender["id"],
                "category": "Fuel",
                "amount": 15,
                "date": "2025-01-04"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let items_for = |id: uuid::Uuid| {
        let db = app.state.db.clone();
        async move {
            paper_item::Entity::find()
                .filter(paper_item::Column::EntryId.eq(id))
                .count(&*db)
                .await
                .unwrap()
        }
    };
    assert_eq!(items_for(paper_id).await, 2);

    let response = app
        .request(Method::DELETE, &format!("/api/v1/companies/{company_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/v1/papers/{paper_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(items_for(paper_id).await, 0);

    let response = app
        .request(Method::GET, &format!("/api/v1/tenders/{tender_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app
        .request(Method::GET, &format!("/api/v1/tenders/{tender_id}/payments"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Only the other company's expense is left in the feed
    let response = app.request(Method::GET, "/api/v1/expenses/feed", None).await;
    let feed = body_json(response).await["data"].clone();
    assert_eq!(feed.as_array().unwrap().len(), 1);
    assert_eq!(feed[0]["label"], "Z-1 - Zed Supplies");
}
