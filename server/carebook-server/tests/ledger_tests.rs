#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;

use common::TestApp;

fn today() -> String {
    Utc::now().date_naive().to_string()
}

#[tokio::test]
async fn add_list_and_dashboard() {
    let app = TestApp::new();
    let (token, _) = app.register("Budget Keeper", "employee").await;

    for amount in [json!(2000), json!("500")] {
        let added = app
            .post(
                "/api/v1/income/add",
                &token,
                json!({ "source": "Salary", "amount": amount, "date": today() }),
            )
            .await;
        assert_eq!(added.status, StatusCode::CREATED, "{}", added.raw);
        assert_eq!(added.body["data"]["source"], "Salary");
        assert_eq!(added.body["data"]["type"], "income");
    }
    for amount in [100, 50] {
        let added = app
            .post(
                "/api/v1/expense/add",
                &token,
                json!({ "category": "Food", "icon": "🍔", "amount": amount, "date": today() }),
            )
            .await;
        assert_eq!(added.status, StatusCode::CREATED, "{}", added.raw);
        assert_eq!(added.body["data"]["category"], "Food");
    }

    let expenses = app.get("/api/v1/expense/get", &token).await;
    assert_eq!(expenses.status, StatusCode::OK);
    assert_eq!(expenses.body["data"].as_array().unwrap().len(), 2);
    let income = app.get("/api/v1/income/get", &token).await;
    assert_eq!(income.body["data"].as_array().unwrap().len(), 2);

    let dashboard = app.get("/api/v1/dashboard", &token).await;
    assert_eq!(dashboard.status, StatusCode::OK);
    let data = &dashboard.body["data"];
    assert_eq!(data["totalIncome"].as_f64(), Some(2500.0));
    assert_eq!(data["totalExpense"].as_f64(), Some(150.0));
    assert_eq!(data["totalBalance"].as_f64(), Some(2350.0));
    assert_eq!(data["recentTransactions"].as_array().unwrap().len(), 4);
    assert_eq!(data["last60DaysIncome"]["total"].as_f64(), Some(2500.0));
}

#[tokio::test]
async fn invalid_entries_are_rejected() {
    let app = TestApp::new();
    let (token, _) = app.register("Sloppy", "employee").await;

    let no_category = app
        .post("/api/v1/expense/add", &token, json!({ "amount": 10, "date": today() }))
        .await;
    assert_eq!(no_category.status, StatusCode::BAD_REQUEST);

    let negative = app
        .post(
            "/api/v1/expense/add",
            &token,
            json!({ "category": "Food", "amount": -5, "date": today() }),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);
    assert!(negative.body["fieldErrors"]["amount"].is_array());

    let not_a_number = app
        .post(
            "/api/v1/income/add",
            &token,
            json!({ "source": "Gift", "amount": "lots", "date": today() }),
        )
        .await;
    assert_eq!(not_a_number.status, StatusCode::BAD_REQUEST);

    let no_date = app
        .post("/api/v1/income/add", &token, json!({ "source": "Gift", "amount": 5 }))
        .await;
    assert_eq!(no_date.status, StatusCode::BAD_REQUEST);
    assert!(no_date.body["fieldErrors"]["date"].is_array());
}

#[tokio::test]
async fn entries_are_private_to_their_owner() {
    let app = TestApp::new();
    let (owner, _) = app.register("Owner", "employee").await;
    let (intruder, _) = app.register("Intruder", "employee").await;

    let added = app
        .post(
            "/api/v1/expense/add",
            &owner,
            json!({ "category": "Rent", "amount": 900, "date": today() }),
        )
        .await;
    let id = added.body["data"]["id"].as_str().unwrap().to_string();

    assert!(app.get("/api/v1/expense/get", &intruder).await.body["data"]
        .as_array()
        .unwrap()
        .is_empty());

    let foreign = app.delete(&format!("/api/v1/expense/{id}"), &intruder).await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);
    assert_eq!(foreign.body["message"], "Expense not found or unauthorized");

    let malformed = app.delete("/api/v1/expense/12345", &owner).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let deleted = app.delete(&format!("/api/v1/expense/{id}"), &owner).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Expense deleted successfully");
}

#[tokio::test]
async fn download_is_a_csv_attachment() {
    let app = TestApp::new();
    let (token, _) = app.register("Accountant", "employee").await;
    app.post(
        "/api/v1/income/add",
        &token,
        json!({ "source": "Consulting, part time", "amount": 1200.5, "date": "2030-01-15" }),
    )
    .await;

    let download = app.get("/api/v1/income/download", &token).await;
    assert_eq!(download.status, StatusCode::OK);
    assert!(download.content_type.unwrap().starts_with("text/csv"));
    assert_eq!(
        download.disposition.as_deref(),
        Some("attachment; filename=\"income_details.csv\"")
    );
    assert_eq!(
        download.raw,
        "Source,Amount,Date\n\"Consulting, part time\",1200.5,2030-01-15\n"
    );
}
