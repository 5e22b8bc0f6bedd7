mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{body_json, TestApp};

async fn record(app: &TestApp, company: &str, amount: Value, date: &str, status: &str) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/v1/projections",
            Some(json!({
                "title": format!("{company} {status}"),
                "company": company,
                "customer": "Copperbelt Energy",
                "amount": amount,
                "project_date": date,
                "status": status
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[tokio::test]
async fn records_take_their_year_from_the_project_date() {
    let app = TestApp::new().await;
    let created = record(&app, "Acme", json!(1200), "2024-11-30", "won").await;

    assert_eq!(created["year"], 2024);
    assert_eq!(created["status"], "WON");
    assert_eq!(created["is_active"], true);

    let id = created["id"].as_str().unwrap();
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/projections/{id}"),
            Some(json!({ "project_date": "2025-01-15", "status": "LOST" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await["data"].clone();
    assert_eq!(updated["year"], 2025);
    assert_eq!(updated["status"], "LOST");
}

#[tokio::test]
async fn new_company_and_default_title_are_applied() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/projections",
            Some(json!({
                "company": "__new__",
                "company_new": "Fresh Ventures",
                "customer": "ZESCO",
                "amount": "5000",
                "project_date": "2025-03-01",
                "status": "PENDING"
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await["data"].clone();
    assert_eq!(created["company"], "Fresh Ventures");
    assert_eq!(created["title"], "Untitled Project");
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let app = TestApp::new().await;
    let base = json!({
        "company": "Acme",
        "customer": "ZESCO",
        "amount": 100,
        "project_date": "2025-03-01",
        "status": "WON"
    });

    let mut bad_date = base.clone();
    bad_date["project_date"] = json!("01/03/2025");
    let response = app
        .request(Method::POST, "/api/v1/projections", Some(bad_date))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_status = base.clone();
    bad_status["status"] = json!("MAYBE");
    let response = app
        .request(Method::POST, "/api/v1/projections", Some(bad_status))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_amount = base.clone();
    bad_amount["amount"] = json!("1.234");
    let response = app
        .request(Method::POST, "/api/v1/projections", Some(bad_amount))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut no_company = base;
    no_company["company"] = json!("__new__");
    let response = app
        .request(Method::POST, "/api/v1/projections", Some(no_company))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn archived_records_disappear_from_lists_and_totals() {
    let app = TestApp::new().await;
    let kept = record(&app, "Acme", json!(1000), "2025-02-01", "WON").await;
    let archived = record(&app, "Acme", json!(4000), "2025-02-02", "WON").await;
    let archived_id = archived["id"].as_str().unwrap();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/projections/{archived_id}/archive"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    // Archiving twice is harmless
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/projections/{archived_id}/archive"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, "/api/v1/projections", None).await;
    let list = body_json(response).await["data"].clone();
    let ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![kept["id"].as_str().unwrap()]);

    let response = app
        .request(Method::GET, &format!("/api/v1/projections/{archived_id}"), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, "/api/v1/projections/dashboard", None)
        .await;
    let dashboard = body_json(response).await["data"].clone();
    assert_eq!(dashboard["total_won"], 1000.0);
}

#[tokio::test]
async fn dashboard_totals_follow_the_filter() {
    let app = TestApp::new().await;
    record(&app, "Acme", json!(1000), "2025-01-10", "WON").await;
    record(&app, "Acme", json!(500), "2025-02-10", "WON").await;
    record(&app, "Zed", json!(3000), "2025-03-10", "WON").await;
    record(&app, "Zed", json!(700), "2025-03-11", "LOST").await;
    record(&app, "Zed", json!(250), "2024-12-01", "PENDING").await;

    let response = app
        .request(Method::GET, "/api/v1/projections/dashboard", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await["data"].clone();
    assert_eq!(dashboard["total_won"], 4500.0);
    assert_eq!(dashboard["total_lost"], 700.0);
    assert_eq!(dashboard["total_pending"], 250.0);
    assert_eq!(dashboard["company_totals"][0]["company"], "Zed");
    assert_eq!(dashboard["company_totals"][0]["total"], 3000.0);
    assert_eq!(dashboard["company_totals"][1]["company"], "Acme");
    assert_eq!(dashboard["company_totals"][1]["total"], 1500.0);
    assert_eq!(dashboard["companies"], json!(["Acme", "Zed"]));
    assert_eq!(dashboard["years"], json!([2025, 2024]));

    let response = app
        .request(
            Method::GET,
            "/api/v1/projections/dashboard?company=Acme&year=2025",
            None,
        )
        .await;
    let filtered = body_json(response).await["data"].clone();
    assert_eq!(filtered["total_won"], 1500.0);
    assert_eq!(filtered["total_lost"], 0.0);
    assert_eq!(filtered["records"].as_array().unwrap().len(), 2);
    // Filter choices still cover every active record
    assert_eq!(filtered["companies"], json!(["Acme", "Zed"]));

    let response = app
        .request(Method::GET, "/api/v1/projections?status=lost", None)
        .await;
    let lost = body_json(response).await["data"].clone();
    assert_eq!(lost.as_array().unwrap().len(), 1);
    assert_eq!(lost[0]["amount"], 700.0);
}
