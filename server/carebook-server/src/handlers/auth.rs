use auth_identity::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
    UserSummary,
};
use axum::{extract::State, http::StatusCode, Json};

use crate::error::{api_message, api_success, ApiError, ApiErrorResponse, ApiResponse};
use crate::extract::ApiJson;
use crate::middleware::AuthContext;
use crate::server::CarebookServer;

/// Create an account and sign it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(server): State<CarebookServer>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let response = server.identity.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(api_message("User registered successfully", response)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(server): State<CarebookServer>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let response = server.identity.authenticate(request).await?;
    Ok(Json(api_success(response)))
}

/// The caller's own account
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = UserSummary),
        (status = 401, description = "Missing or invalid token", body = ApiErrorResponse)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn profile(
    State(server): State<CarebookServer>,
    auth: AuthContext,
) -> Result<Json<ApiResponse<UserSummary>>, ApiError> {
    let user = server.identity.profile(auth.user_id()).await?;
    Ok(Json(api_success(user)))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserSummary),
        (status = 400, description = "Invalid input", body = ApiErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ApiErrorResponse)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserSummary>>, ApiError> {
    let user = server.identity.update_profile(auth.user_id(), request).await?;
    Ok(Json(api_message("Profile updated successfully", user)))
}

/// Existing tokens stay valid after the change
#[utoipa::path(
    put,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully"),
        (status = 400, description = "Wrong current password or new password too short", body = ApiErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ApiErrorResponse)
    ),
    tag = "auth",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<Option<()>>>, ApiError> {
    server.identity.change_password(auth.user_id(), request).await?;
    Ok(Json(api_message("Password changed successfully", None)))
}
