//! Expense and income routes. Both sides share one set of helpers that take
//! the [`EntryKind`]; the per-route functions only pin the kind.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use ledger_service::{Dashboard, EntryKind, EntryRecord, LedgerEntry, NewEntry};

use crate::error::{api_message, api_success, ApiError, ApiErrorResponse, ApiResponse};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthContext;
use crate::server::CarebookServer;

type Created = (StatusCode, Json<ApiResponse<LedgerEntry>>);

async fn add(
    server: &CarebookServer,
    kind: EntryKind,
    auth: &AuthContext,
    request: NewEntry,
) -> Result<Created, ApiError> {
    let entry = server.ledger.add(kind, request, auth.user_id()).await?;
    Ok((
        StatusCode::CREATED,
        Json(api_message(format!("{} added", kind.title()), entry)),
    ))
}

async fn list(
    server: &CarebookServer,
    kind: EntryKind,
    auth: &AuthContext,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>, ApiError> {
    let entries = server.ledger.list(kind, auth.user_id()).await?;
    Ok(Json(api_success(entries)))
}

async fn remove(
    server: &CarebookServer,
    kind: EntryKind,
    auth: &AuthContext,
    raw_id: &str,
) -> Result<Json<ApiResponse<Option<()>>>, ApiError> {
    server.ledger.delete(kind, raw_id, auth.user_id()).await?;
    Ok(Json(api_message(format!("{} deleted successfully", kind.title()), None)))
}

async fn download(
    server: &CarebookServer,
    kind: EntryKind,
    auth: &AuthContext,
) -> Result<Response, ApiError> {
    let export = server.ledger.download(kind, auth.user_id()).await?;
    let headers = [
        (header::CONTENT_TYPE, ledger_service::CsvExport::CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];
    Ok((headers, export.body).into_response())
}

#[utoipa::path(
    post,
    path = "/api/v1/expense/add",
    request_body = NewEntry,
    responses(
        (status = 201, description = "Expense added", body = EntryRecord),
        (status = 400, description = "Missing category, bad amount or date", body = ApiErrorResponse)
    ),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn add_expense(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewEntry>,
) -> Result<Created, ApiError> {
    add(&server, EntryKind::Expense, &auth, request).await
}

#[utoipa::path(
    post,
    path = "/api/v1/income/add",
    request_body = NewEntry,
    responses(
        (status = 201, description = "Income added", body = EntryRecord),
        (status = 400, description = "Missing source, bad amount or date", body = ApiErrorResponse)
    ),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn add_income(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewEntry>,
) -> Result<Created, ApiError> {
    add(&server, EntryKind::Income, &auth, request).await
}

#[utoipa::path(
    get,
    path = "/api/v1/expense/get",
    responses((status = 200, description = "Own expenses, latest first", body = Vec<EntryRecord>)),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn list_expenses(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>, ApiError> {
    list(&server, EntryKind::Expense, &auth).await
}

#[utoipa::path(
    get,
    path = "/api/v1/income/get",
    responses((status = 200, description = "Own income, latest first", body = Vec<EntryRecord>)),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn list_income(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Vec<LedgerEntry>>>, ApiError> {
    list(&server, EntryKind::Income, &auth).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/expense/{id}",
    params(("id" = String, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense deleted successfully"),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 404, description = "Expense not found or unauthorized", body = ApiErrorResponse)
    ),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn delete_expense(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<Option<()>>>, ApiError> {
    remove(&server, EntryKind::Expense, &auth, &id).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/income/{id}",
    params(("id" = String, Path, description = "Income id")),
    responses(
        (status = 200, description = "Income deleted successfully"),
        (status = 400, description = "Malformed id", body = ApiErrorResponse),
        (status = 404, description = "Income not found or unauthorized", body = ApiErrorResponse)
    ),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn delete_income(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<ApiResponse<Option<()>>>, ApiError> {
    remove(&server, EntryKind::Income, &auth, &id).await
}

#[utoipa::path(
    get,
    path = "/api/v1/expense/download",
    responses((status = 200, description = "CSV attachment", content_type = "text/csv", body = String)),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn download_expenses(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    download(&server, EntryKind::Expense, &auth).await
}

#[utoipa::path(
    get,
    path = "/api/v1/income/download",
    responses((status = 200, description = "CSV attachment", content_type = "text/csv", body = String)),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn download_income(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Response, ApiError> {
    download(&server, EntryKind::Income, &auth).await
}

/// Totals, balance and the recent windows of both sides
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses((status = 200, description = "Dashboard", body = Dashboard)),
    tag = "ledger",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    let dashboard = server.ledger.dashboard(auth.user_id()).await?;
    Ok(Json(api_success(dashboard)))
}
