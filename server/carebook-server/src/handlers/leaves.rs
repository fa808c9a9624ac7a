use axum::{extract::State, http::StatusCode, Json};
use leave_service::{ApplyLeave, LeaveView};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_message, api_success, ApiError, ApiErrorResponse, ApiResponse};
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::AuthContext;
use crate::server::CarebookServer;

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveBody {
    pub leave: LeaveView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveList {
    pub leaves: Vec<LeaveView>,
}

#[utoipa::path(
    post,
    path = "/api/leaves/apply",
    request_body = ApplyLeave,
    responses(
        (status = 201, description = "Leave applied", body = LeaveBody),
        (status = 400, description = "Invalid dates or type", body = ApiErrorResponse)
    ),
    tag = "leaves",
    security(("bearer_auth" = []))
)]
pub async fn apply_leave(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<ApplyLeave>,
) -> Result<(StatusCode, Json<ApiResponse<LeaveBody>>), ApiError> {
    let leave = server.leaves.apply(request, auth.user_id()).await?;
    Ok((
        StatusCode::CREATED,
        Json(api_message("Leave applied", LeaveBody { leave })),
    ))
}

/// The caller's own requests, newest first
#[utoipa::path(
    get,
    path = "/api/leaves/my",
    responses((status = 200, description = "Own leave requests", body = LeaveList)),
    tag = "leaves",
    security(("bearer_auth" = []))
)]
pub async fn my_leaves(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<LeaveList>>, ApiError> {
    let leaves = server.leaves.mine(auth.user_id()).await?;
    Ok(Json(api_success(LeaveList { leaves })))
}

#[utoipa::path(
    get,
    path = "/api/leaves/all",
    responses(
        (status = 200, description = "Every leave request", body = LeaveList),
        (status = 403, description = "Manager or admin only", body = ApiErrorResponse)
    ),
    tag = "leaves",
    security(("bearer_auth" = []))
)]
pub async fn all_leaves(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<LeaveList>>, ApiError> {
    auth.require_leave_reviewer()?;
    let leaves = server.leaves.all().await?;
    Ok(Json(api_success(LeaveList { leaves })))
}

/// Withdraw one's own pending request
#[utoipa::path(
    delete,
    path = "/api/leaves/{id}",
    params(("id" = Uuid, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave cancelled"),
        (status = 400, description = "Leave is no longer pending", body = ApiErrorResponse),
        (status = 403, description = "Not the requester", body = ApiErrorResponse),
        (status = 404, description = "Leave not found", body = ApiErrorResponse)
    ),
    tag = "leaves",
    security(("bearer_auth" = []))
)]
pub async fn cancel_leave(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Option<()>>>, ApiError> {
    server.leaves.cancel(id, auth.user_id()).await?;
    Ok(Json(api_message("Leave cancelled", None)))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/approve",
    params(("id" = Uuid, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave approved", body = LeaveBody),
        (status = 400, description = "Leave was already rejected", body = ApiErrorResponse),
        (status = 403, description = "Manager or admin only", body = ApiErrorResponse),
        (status = 404, description = "Leave not found", body = ApiErrorResponse)
    ),
    tag = "leaves",
    security(("bearer_auth" = []))
)]
pub async fn approve_leave(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<LeaveBody>>, ApiError> {
    auth.require_leave_reviewer()?;
    let leave = server.leaves.approve(id, auth.user_id()).await?;
    Ok(Json(api_message("Leave approved", LeaveBody { leave })))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/reject",
    params(("id" = Uuid, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveBody),
        (status = 400, description = "Leave was already approved", body = ApiErrorResponse),
        (status = 403, description = "Manager or admin only", body = ApiErrorResponse),
        (status = 404, description = "Leave not found", body = ApiErrorResponse)
    ),
    tag = "leaves",
    security(("bearer_auth" = []))
)]
pub async fn reject_leave(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<LeaveBody>>, ApiError> {
    auth.require_leave_reviewer()?;
    let leave = server.leaves.reject(id, auth.user_id()).await?;
    Ok(Json(api_message("Leave rejected", LeaveBody { leave })))
}
