use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::error::{api_success, ApiResponse};
use crate::server::CarebookServer;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall system health status
    #[schema(example = "healthy")]
    pub status: String,
    /// Current timestamp in RFC3339 format
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    /// Seconds since the process started
    #[schema(example = 3600)]
    pub uptime: i64,
    /// Individual dependency checks
    pub checks: BTreeMap<String, String>,
}

/// Version information response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    #[schema(example = "Carebook Engine")]
    pub name: String,
    #[schema(example = "0.1.0")]
    pub version: String,
    #[schema(example = "development")]
    pub environment: String,
    /// Route groups served by this process
    #[schema(example = "all")]
    pub unit: String,
    #[schema(example = "memory")]
    pub storage: String,
}

/// Health check handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "System is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(
    State(server): State<CarebookServer>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let storage_ok = server.storage_healthy().await;

    let mut checks = BTreeMap::new();
    checks.insert(
        "storage".to_string(),
        if storage_ok { "healthy" } else { "unreachable" }.to_string(),
    );

    let response = HealthResponse {
        status: if storage_ok { "healthy" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: (chrono::Utc::now() - server.started_at).num_seconds(),
        checks,
    };

    let status = if storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(api_success(response)))
}

/// Version information handler
#[utoipa::path(
    get,
    path = "/version",
    tag = "health",
    responses(
        (status = 200, description = "Version information retrieved successfully", body = VersionResponse)
    )
)]
pub async fn version_info(State(server): State<CarebookServer>) -> Json<ApiResponse<VersionResponse>> {
    let storage = match server.config.storage.backend {
        config_engine::StorageBackend::Postgres => "postgres",
        config_engine::StorageBackend::Memory => "memory",
    };

    Json(api_success(VersionResponse {
        name: "Carebook Engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: server.config.environment.as_str().to_string(),
        unit: server.unit.as_str().to_string(),
        storage: storage.to_string(),
    }))
}
