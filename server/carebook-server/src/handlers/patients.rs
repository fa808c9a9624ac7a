use axum::{extract::State, http::StatusCode, Json};
use patient_service::{
    PatientInput, PatientListQuery, PatientPage, PatientSearchQuery, PatientSearchResult,
    PatientStats, PatientView,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_message, api_success, ApiError, ApiErrorResponse, ApiResponse};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthContext;
use crate::server::CarebookServer;

/// `{ patient }` payload of the single-record routes
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientBody {
    pub patient: PatientView,
}

impl From<PatientView> for PatientBody {
    fn from(patient: PatientView) -> Self {
        Self { patient }
    }
}

/// List patients with free-text search, status filter, sorting and paging
#[utoipa::path(
    get,
    path = "/api/patients",
    params(PatientListQuery),
    responses(
        (status = 200, description = "One page of patients", body = PatientPage),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
        (status = 403, description = "Role not permitted", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn list_patients(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<PatientListQuery>,
) -> Result<Json<ApiResponse<PatientPage>>, ApiError> {
    auth.require_clinical()?;
    let page = server.patients.list(&query).await?;
    Ok(Json(api_success(page)))
}

/// Field-by-field search, capped at 50 results
#[utoipa::path(
    get,
    path = "/api/patients/search",
    params(PatientSearchQuery),
    responses(
        (status = 200, description = "Matching patients", body = PatientSearchResult),
        (status = 400, description = "Invalid filter", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn search_patients(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<PatientSearchQuery>,
) -> Result<Json<ApiResponse<PatientSearchResult>>, ApiError> {
    auth.require_clinical()?;
    let result = server.patients.search(query).await?;
    Ok(Json(api_success(result)))
}

#[utoipa::path(
    get,
    path = "/api/patients/stats",
    responses(
        (status = 200, description = "Registry statistics", body = PatientStats)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn patient_stats(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<PatientStats>>, ApiError> {
    auth.require_clinical()?;
    let stats = server.patients.stats().await?;
    Ok(Json(api_success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient found", body = PatientBody),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn get_patient(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<PatientBody>>, ApiError> {
    auth.require_clinical()?;
    let patient = server.patients.get(id).await?;
    Ok(Json(api_success(patient.into())))
}

/// Register a patient; the `PAT######` id is assigned here
#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = PatientInput,
    responses(
        (status = 201, description = "Patient created successfully", body = PatientBody),
        (status = 400, description = "Invalid input or duplicate patient id", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn create_patient(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(input): ApiJson<PatientInput>,
) -> Result<(StatusCode, Json<ApiResponse<PatientBody>>), ApiError> {
    auth.require_clinical()?;
    let patient = server.patients.create(input, Some(auth.user_id())).await?;
    Ok((
        StatusCode::CREATED,
        Json(api_message("Patient created successfully", patient.into())),
    ))
}

#[utoipa::path(
    put,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient record id")),
    request_body = PatientInput,
    responses(
        (status = 200, description = "Patient updated successfully", body = PatientBody),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn update_patient(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<PatientInput>,
) -> Result<Json<ApiResponse<PatientBody>>, ApiError> {
    auth.require_clinical()?;
    let patient = server.patients.update(id, input, Some(auth.user_id())).await?;
    Ok(Json(api_message("Patient updated successfully", patient.into())))
}

/// Soft delete: the record stays, its status becomes `inactive`
#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient record id")),
    responses(
        (status = 200, description = "Patient deactivated successfully", body = PatientBody),
        (status = 404, description = "Patient not found", body = ApiErrorResponse)
    ),
    tag = "patients",
    security(("bearer_auth" = []))
)]
pub async fn deactivate_patient(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<PatientBody>>, ApiError> {
    auth.require_clinical()?;
    let patient = server.patients.deactivate(id, Some(auth.user_id())).await?;
    Ok(Json(api_message("Patient deactivated successfully", patient.into())))
}
