#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{patient_body, TestApp};

#[tokio::test]
async fn non_clinical_roles_are_forbidden() {
    let app = TestApp::new();
    let (token, _) = app.register("Office Worker", "employee").await;

    let response = app.get("/api/patients", &token).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["errorType"], "authorization_error");
}

#[tokio::test]
async fn create_assigns_sequential_patient_ids() {
    let app = TestApp::new();
    let (token, _) = app.register("Front Desk", "receptionist").await;

    let first = app.post("/api/patients", &token, patient_body("Jane", "555-123-4567")).await;
    assert_eq!(first.status, StatusCode::CREATED, "{}", first.raw);
    assert_eq!(first.body["message"], "Patient created successfully");
    let patient = &first.body["data"]["patient"];
    assert_eq!(patient["patientId"], "PAT000001");
    assert_eq!(patient["fullName"], "Jane Doe");
    assert_eq!(patient["status"], "active");
    assert!(patient["age"].as_u64().is_some());

    let second = app.post("/api/patients", &token, patient_body("Mary", "555-765-4321")).await;
    assert_eq!(second.body["data"]["patient"]["patientId"], "PAT000002");
}

#[tokio::test]
async fn invalid_patient_reports_field_errors() {
    let app = TestApp::new();
    let (token, _) = app.register("Nurse Joy", "nurse").await;

    let mut body = patient_body("", "555-123-4567");
    body["contactInfo"]["phone"] = json!("");
    let response = app.post("/api/patients", &token, body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errorType"], "validation_error");
    let fields = response.body["fieldErrors"].as_object().unwrap();
    assert!(fields.keys().any(|k| k.contains("firstName")));
    assert!(fields.keys().any(|k| k.contains("phone")));
}

#[tokio::test]
async fn get_update_and_soft_delete() {
    let app = TestApp::new();
    let (token, _) = app.register("Dr Who", "doctor").await;

    let created = app.post("/api/patients", &token, patient_body("Amy", "555-222-3333")).await;
    let id = created.body["data"]["patient"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/patients/{id}");

    let fetched = app.get(&uri, &token).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["patient"]["patientId"], "PAT000001");

    let mut changed = patient_body("Amelia", "555-222-3333");
    changed["patientId"] = json!("PAT999999");
    let updated = app.put(&uri, &token, changed).await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.raw);
    assert_eq!(updated.body["data"]["patient"]["fullName"], "Amelia Doe");
    assert_eq!(updated.body["data"]["patient"]["patientId"], "PAT000001");

    let deleted = app.delete(&uri, &token).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Patient deactivated successfully");
    assert_eq!(deleted.body["data"]["patient"]["status"], "inactive");

    // Soft delete keeps the record readable
    let after = app.get(&uri, &token).await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["data"]["patient"]["status"], "inactive");
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = TestApp::new();
    let (token, _) = app.register("Dr House", "doctor").await;

    let missing = app
        .get("/api/patients/00000000-0000-4000-8000-000000000000", &token)
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Patient not found");

    let malformed = app.get("/api/patients/not-a-uuid", &token).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_search_and_stats() {
    let app = TestApp::new();
    let (token, _) = app.register("Admin", "admin").await;

    for (name, phone) in [("Alice", "555-000-1111"), ("Bob", "555-000-2222"), ("Carol", "555-000-3333")] {
        let response = app.post("/api/patients", &token, patient_body(name, phone)).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.raw);
    }

    let page = app.get("/api/patients?page=1&limit=2", &token).await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["data"]["patients"].as_array().unwrap().len(), 2);
    let pagination = &page.body["data"]["pagination"];
    assert_eq!(pagination["totalRecords"], 3);
    assert_eq!(pagination["totalPages"], 2);
    assert_eq!(pagination["hasNext"], true);
    assert_eq!(pagination["hasPrev"], false);

    let free_text = app.get("/api/patients?search=bob", &token).await;
    assert_eq!(free_text.body["data"]["patients"].as_array().unwrap().len(), 1);

    let search = app.get("/api/patients/search?firstName=car", &token).await;
    assert_eq!(search.status, StatusCode::OK);
    assert_eq!(search.body["data"]["count"], 1);
    assert_eq!(search.body["data"]["patients"][0]["fullName"], "Carol Doe");

    let stats = app.get("/api/patients/stats", &token).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["data"]["overview"]["totalPatients"], 3);
    assert_eq!(stats.body["data"]["overview"]["activePatients"], 3);
    assert_eq!(stats.body["data"]["genderStats"]["female"], 3);
}

#[tokio::test]
async fn unknown_gender_is_reported_under_its_path() {
    let app = TestApp::new();
    let (token, _) = app.register("Registrar", "receptionist").await;

    let mut body = patient_body("Robin", "555-444-1111");
    body["personalInfo"]["gender"] = json!("robot");
    let response = app.post("/api/patients", &token, body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["fieldErrors"]["personalInfo.gender"].is_array(), "{}", response.raw);
}
