use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `bearer_auth` scheme referenced by protected routes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::handlers::health::health_check,
        crate::handlers::health::version_info,

        // Account endpoints
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::profile,
        crate::handlers::auth::update_profile,
        crate::handlers::auth::change_password,

        // Patient endpoints
        crate::handlers::patients::list_patients,
        crate::handlers::patients::search_patients,
        crate::handlers::patients::patient_stats,
        crate::handlers::patients::get_patient,
        crate::handlers::patients::create_patient,
        crate::handlers::patients::update_patient,
        crate::handlers::patients::deactivate_patient,

        // Appointment endpoints
        crate::handlers::appointments::list_appointments,
        crate::handlers::appointments::doctor_schedule,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::update_appointment,
        crate::handlers::appointments::cancel_appointment,
        crate::handlers::appointments::change_status,
        crate::handlers::appointments::reschedule_appointment,

        // Leave endpoints
        crate::handlers::leaves::apply_leave,
        crate::handlers::leaves::my_leaves,
        crate::handlers::leaves::all_leaves,
        crate::handlers::leaves::cancel_leave,
        crate::handlers::leaves::approve_leave,
        crate::handlers::leaves::reject_leave,

        // Ledger endpoints
        crate::handlers::ledger::add_expense,
        crate::handlers::ledger::add_income,
        crate::handlers::ledger::list_expenses,
        crate::handlers::ledger::list_income,
        crate::handlers::ledger::delete_expense,
        crate::handlers::ledger::delete_income,
        crate::handlers::ledger::download_expenses,
        crate::handlers::ledger::download_income,
        crate::handlers::ledger::dashboard,
    ),
    components(
        schemas(
            crate::error::ApiErrorResponse,
            crate::handlers::health::HealthResponse,
            crate::handlers::health::VersionResponse,
            crate::handlers::patients::PatientBody,
            crate::handlers::appointments::AppointmentBody,
            crate::handlers::leaves::LeaveBody,
            crate::handlers::leaves::LeaveList,
            database_layer::PageInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and version"),
        (name = "auth", description = "Registration, login, profile and password"),
        (name = "patients", description = "Patient registry"),
        (name = "appointments", description = "Doctor appointments and their lifecycle"),
        (name = "leaves", description = "Employee leave requests"),
        (name = "ledger", description = "Personal expense and income ledger"),
    ),
    info(
        title = "Carebook Engine API",
        version = "0.1.0",
        description = "Hospital records, staff leave and personal ledger services.",
    ),
)]
pub struct ApiDoc;

/// Serve the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
