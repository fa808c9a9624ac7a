#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use config_engine::ServiceConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

use carebook_server::{create_app, CarebookServer};

/// In-memory application shared by one test
pub struct TestApp {
    pub app: Router,
}

/// Status plus parsed JSON body (or `Value::Null` for non-JSON bodies)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: String,
    pub content_type: Option<String>,
    pub disposition: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let server = CarebookServer::in_memory(ServiceConfig::for_tests("integration-secret"))
            .expect("Failed to create test server");
        Self {
            app: create_app(server),
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let header_value = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header_value(header::CONTENT_TYPE);
        let disposition = header_value(header::CONTENT_DISPOSITION);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let raw = String::from_utf8(bytes.to_vec()).unwrap();
        let body = serde_json::from_str(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            raw,
            content_type,
            disposition,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Register an account and return `(token, user id)`
    pub async fn register(&self, name: &str, role: &str) -> (String, String) {
        let email = format!("{}@carebook.test", name.to_lowercase().replace(' ', "."));
        let response = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": name,
                    "email": email,
                    "password": "correct-horse",
                    "role": role
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.raw);
        let data = &response.body["data"];
        (
            data["token"].as_str().unwrap().to_string(),
            data["user"]["id"].as_str().unwrap().to_string(),
        )
    }
}

pub fn patient_body(first_name: &str, phone: &str) -> Value {
    json!({
        "personalInfo": {
            "firstName": first_name,
            "lastName": "Doe",
            "dateOfBirth": "1990-04-12",
            "gender": "female",
            "bloodType": "O+"
        },
        "contactInfo": {
            "phone": phone,
            "email": format!("{}@example.com", first_name.to_lowercase()),
            "address": { "city": "Springfield" }
        },
        "emergencyContact": {
            "name": "John Doe",
            "relationship": "Spouse",
            "phone": "555-0100-22"
        }
    })
}

pub fn appointment_body(patient: &str, doctor: &str, date: &str, time: &str) -> Value {
    json!({
        "patientId": patient,
        "doctorId": doctor,
        "appointmentDate": date,
        "appointmentTime": time,
        "appointmentType": "consultation",
        "department": "general",
        "reason": "Routine check"
    })
}
