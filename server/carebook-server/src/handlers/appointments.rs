use axum::{extract::State, http::StatusCode, Json};
use scheduling_service::{
    AppointmentChanges, AppointmentListQuery, AppointmentPage, AppointmentView, CancelRequest,
    DoctorSchedule, NewAppointment, RescheduleRequest, ScheduleQuery, StatusChange,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_message, api_success, ApiError, ApiErrorResponse, ApiResponse};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthContext;
use crate::server::CarebookServer;

/// `{ appointment }` payload of the single-record routes
#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentBody {
    pub appointment: AppointmentView,
}

impl From<AppointmentView> for AppointmentBody {
    fn from(appointment: AppointmentView) -> Self {
        Self { appointment }
    }
}

#[utoipa::path(
    get,
    path = "/api/appointments",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Appointments ordered by date and time", body = AppointmentPage),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn list_appointments(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiQuery(query): ApiQuery<AppointmentListQuery>,
) -> Result<Json<ApiResponse<AppointmentPage>>, ApiError> {
    auth.require_clinical()?;
    let page = server.scheduling.list(&query).await?;
    Ok(Json(api_success(page)))
}

/// A doctor's non-cancelled appointments on one day
#[utoipa::path(
    get,
    path = "/api/appointments/doctor/{doctor_id}/schedule",
    params(
        ("doctor_id" = Uuid, Path, description = "Doctor account id"),
        ScheduleQuery
    ),
    responses(
        (status = 200, description = "Day schedule ordered by time", body = DoctorSchedule),
        (status = 400, description = "Date missing", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn doctor_schedule(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(doctor_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ScheduleQuery>,
) -> Result<Json<ApiResponse<DoctorSchedule>>, ApiError> {
    auth.require_clinical()?;
    let schedule = server.scheduling.doctor_schedule(doctor_id, query.date).await?;
    Ok(Json(api_success(schedule)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment record id")),
    responses(
        (status = 200, description = "Appointment found", body = AppointmentBody),
        (status = 404, description = "Appointment not found", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn get_appointment(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    auth.require_clinical()?;
    let appointment = server.scheduling.get(id).await?;
    Ok(Json(api_success(appointment.into())))
}

/// Book a slot; fails when the doctor already holds that date and time
#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = NewAppointment,
    responses(
        (status = 201, description = "Appointment scheduled successfully", body = AppointmentBody),
        (status = 400, description = "Invalid input or slot taken", body = ApiErrorResponse),
        (status = 404, description = "Patient or doctor not found", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn create_appointment(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewAppointment>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentBody>>), ApiError> {
    auth.require_clinical()?;
    let appointment = server.scheduling.create(request, auth.user_id()).await?;
    Ok((
        StatusCode::CREATED,
        Json(api_message("Appointment scheduled successfully", appointment.into())),
    ))
}

/// Detail update; status and slot keys are ignored
#[utoipa::path(
    put,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "Appointment record id")),
    request_body = AppointmentChanges,
    responses(
        (status = 200, description = "Appointment updated successfully", body = AppointmentBody),
        (status = 404, description = "Appointment not found", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn update_appointment(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<AppointmentChanges>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    auth.require_clinical()?;
    let appointment = server.scheduling.update(id, changes, auth.user_id()).await?;
    Ok(Json(api_message("Appointment updated successfully", appointment.into())))
}

#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/cancel",
    params(("id" = Uuid, Path, description = "Appointment record id")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Appointment cancelled successfully", body = AppointmentBody),
        (status = 400, description = "Appointment can no longer be cancelled", body = ApiErrorResponse),
        (status = 404, description = "Appointment not found", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn cancel_appointment(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CancelRequest>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    auth.require_clinical()?;
    let appointment = server.scheduling.cancel(id, request, auth.user_id()).await?;
    Ok(Json(api_message("Appointment cancelled successfully", appointment.into())))
}

/// Confirm, start, complete or mark a no-show
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/status",
    params(("id" = Uuid, Path, description = "Appointment record id")),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Appointment status updated", body = AppointmentBody),
        (status = 400, description = "Transition not allowed", body = ApiErrorResponse),
        (status = 404, description = "Appointment not found", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn change_status(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(change): ApiJson<StatusChange>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    auth.require_clinical()?;
    let appointment = server.scheduling.change_status(id, change, auth.user_id()).await?;
    Ok(Json(api_message("Appointment status updated", appointment.into())))
}

#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/reschedule",
    params(("id" = Uuid, Path, description = "Appointment record id")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Appointment rescheduled successfully", body = AppointmentBody),
        (status = 400, description = "New slot taken or transition not allowed", body = ApiErrorResponse),
        (status = 404, description = "Appointment not found", body = ApiErrorResponse)
    ),
    tag = "appointments",
    security(("bearer_auth" = []))
)]
pub async fn reschedule_appointment(
    State(server): State<CarebookServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RescheduleRequest>,
) -> Result<Json<ApiResponse<AppointmentBody>>, ApiError> {
    auth.require_clinical()?;
    let appointment = server.scheduling.reschedule(id, request, auth.user_id()).await?;
    Ok(Json(api_message("Appointment rescheduled successfully", appointment.into())))
}
