#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_and_version_need_no_token() {
    let app = TestApp::new();

    let health = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["data"]["status"], "healthy");
    assert_eq!(health.body["data"]["checks"]["storage"], "healthy");

    let version = app.send(Method::GET, "/version", None, None).await;
    assert_eq!(version.status, StatusCode::OK);
    assert_eq!(version.body["data"]["storage"], "memory");
    assert_eq!(version.body["data"]["unit"], "all");
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let app = TestApp::new();
    let doc = app.send(Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(doc.status, StatusCode::OK);
    let paths = doc.body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/patients"));
    assert!(paths.contains_key("/api/appointments/{id}/reschedule"));
    assert!(paths.contains_key("/api/v1/dashboard"));
    assert!(paths.contains_key("/api/auth/change-password"));
}

#[tokio::test]
async fn register_login_and_profile() {
    let app = TestApp::new();
    let (token, user_id) = app.register("Grace Hopper", "doctor").await;

    let login = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "GRACE.HOPPER@carebook.test", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.raw);
    assert!(login.body["data"]["token"].as_str().is_some());
    assert!(login.body["data"]["expiresAt"].as_str().is_some());

    let profile = app.get("/api/auth/profile", &token).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["data"]["id"], user_id.as_str());
    assert_eq!(profile.body["data"]["role"], "doctor");
    assert_eq!(profile.body["data"]["email"], "grace.hopper@carebook.test");
}

#[tokio::test]
async fn duplicate_email_is_a_bad_request() {
    let app = TestApp::new();
    app.register("Ada", "employee").await;

    let again = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ada", "email": "ada@carebook.test", "password": "another-one" })),
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["success"], false);
    assert_eq!(again.body["errorType"], "conflict");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new();
    app.register("Linus", "employee").await;

    let login = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "linus@carebook.test", "password": "wrong-horse" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn short_password_reports_the_field() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Short", "email": "short@carebook.test", "password": "abc" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["fieldErrors"]["password"].is_array());
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = TestApp::new();

    let missing = app.send(Method::GET, "/api/auth/profile", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["errorType"], "authentication_error");

    let garbage = app.get("/api/leaves/my", "not-a-jwt").await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new();
    let response = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@carebook.test" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["errorType"], "validation_error");
}

#[tokio::test]
async fn profile_update_changes_name_and_specialization() {
    let app = TestApp::new();
    let (token, user_id) = app.register("Derek Shepherd", "doctor").await;

    let updated = app
        .put(
            "/api/auth/profile",
            &token,
            json!({ "name": "Dr. Derek Shepherd", "specialization": "neurosurgery" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.raw);
    assert_eq!(updated.body["message"], "Profile updated successfully");
    assert_eq!(updated.body["data"]["id"], user_id.as_str());
    assert_eq!(updated.body["data"]["name"], "Dr. Derek Shepherd");
    assert_eq!(updated.body["data"]["specialization"], "neurosurgery");
    assert_eq!(updated.body["data"]["email"], "derek.shepherd@carebook.test");

    let profile = app.get("/api/auth/profile", &token).await;
    assert_eq!(profile.body["data"]["name"], "Dr. Derek Shepherd");

    let blank = app.put("/api/auth/profile", &token, json!({ "name": "  " })).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);
    assert!(blank.body["fieldErrors"]["name"].is_array());

    let anonymous = app
        .send(Method::PUT, "/api/auth/profile", None, Some(json!({ "name": "Nobody" })))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn changed_password_is_required_at_next_login() {
    let app = TestApp::new();
    let (token, _) = app.register("Miranda Bailey", "employee").await;

    let changed = app
        .put(
            "/api/auth/change-password",
            &token,
            json!({ "currentPassword": "correct-horse", "newPassword": "battery-staple" }),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK, "{}", changed.raw);
    assert_eq!(changed.body["message"], "Password changed successfully");

    let login = |password: &'static str| {
        app.send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "miranda.bailey@carebook.test", "password": password })),
        )
    };
    assert_eq!(login("correct-horse").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(login("battery-staple").await.status, StatusCode::OK);
}

#[tokio::test]
async fn password_change_rejects_wrong_current_or_short_new() {
    let app = TestApp::new();
    let (token, _) = app.register("Richard Webber", "employee").await;

    let wrong = app
        .put(
            "/api/auth/change-password",
            &token,
            json!({ "currentPassword": "not-my-password", "newPassword": "battery-staple" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.body["message"], "Current password is incorrect");
    assert!(wrong.body["fieldErrors"]["currentPassword"].is_array());

    let short = app
        .put(
            "/api/auth/change-password",
            &token,
            json!({ "currentPassword": "correct-horse", "newPassword": "abc" }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert!(short.body["fieldErrors"]["newPassword"].is_array());

    let unchanged = app
        .send(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "richard.webber@carebook.test", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(unchanged.status, StatusCode::OK);
}
