mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{body_json, TestApp};

async fn pay(app: &TestApp, tender_id: &str, amount: Value, date: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/payments",
            Some(json!({ "tender_id": tender_id, "amount": amount, "date": date })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn spend(app: &TestApp, tender_id: &str, amount: Value, date: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/expenses",
            Some(json!({
                "tender_id": tender_id,
                "category": "Materials",
                "amount": amount,
                "date": date
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn tender(app: &TestApp, id: &str) -> Value {
    let response = app
        .request(Method::GET, &format!("/api/v1/tenders/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn payment_status_follows_every_payment_change() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let created = app
        .create_tender(company["id"].as_str().unwrap(), "T-001", json!(1000))
        .await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["payment_status"], "Pending");
    assert_eq!(created["duration_days"], 89);

    let first = pay(&app, id, json!(400), "2025-01-15").await;
    assert_eq!(tender(&app, id).await["payment_status"], "Partially Paid");

    let second = pay(&app, id, json!("600"), "2025-02-15").await;
    let paid = tender(&app, id).await;
    assert_eq!(paid["payment_status"], "Paid");
    assert_eq!(paid["balance"], 0.0);
    assert_eq!(paid["payment_count"], 2);

    // The stored status drives the filter
    let response = app
        .request(Method::GET, "/api/v1/tenders?status=Paid", None)
        .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let second_id = second["id"].as_str().unwrap();
    let response = app
        .request(Method::DELETE, &format!("/api/v1/payments/{second_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(tender(&app, id).await["payment_status"], "Partially Paid");

    let response = app
        .request(
            Method::GET,
            "/api/v1/tenders?status=Partially_Paid",
            None,
        )
        .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let first_id = first["id"].as_str().unwrap();
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/payments/{first_id}"),
            Some(json!({ "amount": 1000 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(tender(&app, id).await["payment_status"], "Paid");

    // Raising the value reopens the balance
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/tenders/{id}"),
            Some(json!({ "total_value": 2500 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let reopened = body_json(response).await["data"].clone();
    assert_eq!(reopened["payment_status"], "Partially Paid");
    assert_eq!(reopened["balance"], 1100.0);
}

#[tokio::test]
async fn bad_payments_are_rejected() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let created = app
        .create_tender(company["id"].as_str().unwrap(), "T-001", json!(1000))
        .await;
    let id = created["id"].as_str().unwrap();

    let missing_amount = json!({ "tender_id": id });
    let malformed = json!({ "tender_id": id, "amount": "ten" });
    let negative = json!({ "tender_id": id, "amount": -5 });
    let unknown_tender = json!({ "tender_id": uuid::Uuid::new_v4(), "amount": 10 });

    for payload in [missing_amount, malformed, negative, unknown_tender] {
        let response = app
            .request(Method::POST, "/api/v1/payments", Some(payload.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{payload}");
    }

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/tenders/{}/payments", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(tender(&app, id).await["payment_count"], 0);
}

#[tokio::test]
async fn duplicate_tender_numbers_conflict() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let company_id = company["id"].as_str().unwrap();
    app.create_tender(company_id, "T-001", json!(1000)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/tenders",
            Some(json!({
                "tender_no": "T-001",
                "company_id": company_id,
                "client_name": "Someone Else",
                "total_value": 10
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn financials_report_profit_and_overrun() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let created = app
        .create_tender(company["id"].as_str().unwrap(), "T-001", json!(1000))
        .await;
    let id = created["id"].as_str().unwrap();

    spend(&app, id, json!(700), "2025-01-10").await;
    spend(&app, id, json!("550.50"), "2025-01-20").await;

    let loaded = tender(&app, id).await;
    assert_eq!(loaded["total_expenses"], 1250.5);
    assert_eq!(loaded["profit"], -250.5);
    assert_eq!(loaded["expense_overrun"], 250.5);
    assert_eq!(loaded["expenses"].as_array().unwrap().len(), 2);
    // newest first
    assert_eq!(loaded["expenses"][0]["date"], "2025-01-20");
}

#[tokio::test]
async fn summary_and_company_dashboard_cover_every_company() {
    let app = TestApp::new().await;
    let zed = app.create_company("Zed Supplies", "zed").await;
    let acme = app.create_company("Acme Trading", "acme").await;
    app.create_company("Idle Holdings", "idle").await;

    let acme_id = acme["id"].as_str().unwrap();
    let zed_id = zed["id"].as_str().unwrap();
    let a1 = app.create_tender(acme_id, "A-1", json!(1000)).await;
    let a2 = app.create_tender(acme_id, "A-2", json!(500)).await;
    let z1 = app.create_tender(zed_id, "Z-1", json!(2000)).await;

    pay(&app, a1["id"].as_str().unwrap(), json!(1000), "2025-01-05").await;
    pay(&app, z1["id"].as_str().unwrap(), json!(500), "2025-01-05").await;
    spend(&app, a2["id"].as_str().unwrap(), json!(750), "2025-01-06").await;
    spend(&app, z1["id"].as_str().unwrap(), json!(250), "2025-01-06").await;

    let response = app.request(Method::GET, "/api/v1/tenders/summary", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await["data"].clone();
    assert_eq!(summary["total_tenders"], 3);
    assert_eq!(summary["total_companies"], 3);
    assert_eq!(summary["total_tender_value"], 3500.0);
    assert_eq!(summary["total_paid"], 1500.0);
    assert_eq!(summary["total_expenses"], 1000.0);
    assert_eq!(summary["total_profit"], 2500.0);
    assert_eq!(
        summary["status_counts"],
        json!({ "Pending": 1, "Partially_Paid": 1, "Paid": 1 })
    );

    let response = app
        .request(Method::GET, "/api/v1/tenders/by-company", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await["data"].clone();
    assert_eq!(
        dashboard["labels"],
        json!(["Acme Trading", "Idle Holdings", "Zed Supplies"])
    );
    assert_eq!(dashboard["values"], json!([1500.0, 0.0, 2000.0]));
    assert_eq!(dashboard["paids"], json!([1000.0, 0.0, 500.0]));
    assert_eq!(dashboard["expenses"], json!([750.0, 0.0, 250.0]));
    assert_eq!(dashboard["profits"], json!([750.0, 0.0, 1750.0]));
    // A-2 alone overruns by 250; A-1 has no expenses to offset it
    assert_eq!(dashboard["overruns"], json!([250.0, 0.0, 0.0]));
}

#[tokio::test]
async fn expense_listing_pages_and_labels_rows() {
    let app = TestApp::with_config(|cfg| cfg.expense_page_size = 2).await;
    let acme = app.create_company("Acme Trading", "acme").await;
    let zed = app.create_company("Zed Supplies", "zed").await;
    let acme_tender = app
        .create_tender(acme["id"].as_str().unwrap(), "A-1", json!(10000))
        .await;
    let zed_tender = app
        .create_tender(zed["id"].as_str().unwrap(), "Z-1", json!(10000))
        .await;
    let acme_tender_id = acme_tender["id"].as_str().unwrap();

    spend(&app, acme_tender_id, json!(100), "2025-01-01").await;
    spend(&app, acme_tender_id, json!(200), "2025-01-02").await;
    spend(&app, acme_tender_id, json!(300), "2025-01-03").await;
    spend(&app, zed_tender["id"].as_str().unwrap(), json!(5000), "2025-01-04").await;

    let acme_id = acme["id"].as_str().unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/expenses?company_id={acme_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await["data"].clone();
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["total_amount"], 600.0);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert_eq!(page["items"][0]["amount"], 300.0);
    assert_eq!(page["items"][0]["label"], "A-1 - Acme Trading");

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/expenses?company_id={acme_id}&page=2"),
            None,
        )
        .await;
    let second = body_json(response).await["data"].clone();
    assert_eq!(second["items"].as_array().unwrap().len(), 1);
    assert_eq!(second["items"][0]["amount"], 100.0);
    assert_eq!(second["total_amount"], 600.0);

    let response = app.request(Method::GET, "/api/v1/expenses/feed", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let feed = body_json(response).await["data"].clone();
    assert_eq!(feed.as_array().unwrap().len(), 4);
    assert_eq!(feed[0]["label"], "Z-1 - Zed Supplies");
}

#[tokio::test]
async fn deleting_a_tender_removes_its_records() {
    let app = TestApp::new().await;
    let company = app.create_company("Acme Trading", "acme").await;
    let created = app
        .create_tender(company["id"].as_str().unwrap(), "T-001", json!(1000))
        .await;
    let id = created["id"].as_str().unwrap();
    spend(&app, id, json!(10), "2025-01-01").await;
    pay(&app, id, json!(10), "2025-01-01").await;

    let response = app
        .request(Method::DELETE, &format!("/api/v1/tenders/{id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request(Method::GET, "/api/v1/expenses/feed", None).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());

    let response = app
        .request(Method::GET, &format!("/api/v1/tenders/{id}/payments"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
