pub mod paths;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{
    handlers::{appointments, auth, health, leaves, ledger, patients},
    openapi,
    server::{CarebookServer, Unit},
};

/// Create health check routes
pub fn health_routes() -> Router<CarebookServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
        .route(paths::health::OPENAPI, get(openapi::openapi_json))
}

/// Create account routes
pub fn auth_routes() -> Router<CarebookServer> {
    Router::new()
        .route(paths::auth::REGISTER, post(auth::register))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(
            paths::auth::PROFILE,
            get(auth::profile).put(auth::update_profile),
        )
        .route(paths::auth::CHANGE_PASSWORD, put(auth::change_password))
}

/// Create patient registry routes
pub fn patient_routes() -> Router<CarebookServer> {
    Router::new()
        .route(
            paths::patients::PATIENTS,
            get(patients::list_patients).post(patients::create_patient),
        )
        .route(paths::patients::SEARCH, get(patients::search_patients))
        .route(paths::patients::STATS, get(patients::patient_stats))
        .route(
            paths::patients::PATIENT_BY_ID,
            get(patients::get_patient)
                .put(patients::update_patient)
                .delete(patients::deactivate_patient),
        )
}

/// Create appointment routes
pub fn appointment_routes() -> Router<CarebookServer> {
    Router::new()
        .route(
            paths::appointments::APPOINTMENTS,
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            paths::appointments::DOCTOR_SCHEDULE,
            get(appointments::doctor_schedule),
        )
        .route(
            paths::appointments::APPOINTMENT_BY_ID,
            get(appointments::get_appointment).put(appointments::update_appointment),
        )
        .route(paths::appointments::CANCEL, patch(appointments::cancel_appointment))
        .route(paths::appointments::STATUS, patch(appointments::change_status))
        .route(
            paths::appointments::RESCHEDULE,
            patch(appointments::reschedule_appointment),
        )
}

/// Create leave request routes
pub fn leave_routes() -> Router<CarebookServer> {
    Router::new()
        .route(paths::leaves::APPLY, post(leaves::apply_leave))
        .route(paths::leaves::MY, get(leaves::my_leaves))
        .route(paths::leaves::ALL, get(leaves::all_leaves))
        .route(paths::leaves::LEAVE_BY_ID, delete(leaves::cancel_leave))
        .route(paths::leaves::APPROVE, put(leaves::approve_leave))
        .route(paths::leaves::REJECT, put(leaves::reject_leave))
}

/// Create expense and income ledger routes
pub fn ledger_routes() -> Router<CarebookServer> {
    Router::new()
        .route(paths::ledger::EXPENSE_ADD, post(ledger::add_expense))
        .route(paths::ledger::EXPENSE_GET, get(ledger::list_expenses))
        .route(paths::ledger::EXPENSE_DOWNLOAD, get(ledger::download_expenses))
        .route(paths::ledger::EXPENSE_BY_ID, delete(ledger::delete_expense))
        .route(paths::ledger::INCOME_ADD, post(ledger::add_income))
        .route(paths::ledger::INCOME_GET, get(ledger::list_income))
        .route(paths::ledger::INCOME_DOWNLOAD, get(ledger::download_income))
        .route(paths::ledger::INCOME_BY_ID, delete(ledger::delete_income))
        .route(paths::ledger::DASHBOARD, get(ledger::dashboard))
}

/// Create all routes served by `unit`
pub fn create_routes(unit: Unit) -> Router<CarebookServer> {
    let mut router = Router::new().merge(health_routes()).merge(auth_routes());

    if unit.serves_hospital() {
        router = router.merge(patient_routes()).merge(appointment_routes());
    }
    if unit.serves_leave() {
        router = router.merge(leave_routes());
    }
    if unit.serves_ledger() {
        router = router.merge(ledger_routes());
    }

    router
}
