//! Route path constants
//!
//! utoipa `#[utoipa::path(...)]` attributes need string literals, so the
//! paths in handler annotations are spelled out and must match these
//! constants exactly (`:id` here is `{id}` there).

/// Health check endpoints
pub mod health {
    pub const HEALTH: &str = "/health";
    pub const VERSION: &str = "/version";
    pub const OPENAPI: &str = "/api-docs/openapi.json";
}

/// Account endpoints
pub mod auth {
    pub const REGISTER: &str = "/api/auth/register";
    pub const LOGIN: &str = "/api/auth/login";
    pub const PROFILE: &str = "/api/auth/profile";
    pub const CHANGE_PASSWORD: &str = "/api/auth/change-password";
}

/// Patient registry endpoints
pub mod patients {
    pub const PATIENTS: &str = "/api/patients";
    pub const SEARCH: &str = "/api/patients/search";
    pub const STATS: &str = "/api/patients/stats";
    pub const PATIENT_BY_ID: &str = "/api/patients/:id";
}

/// Appointment endpoints
pub mod appointments {
    pub const APPOINTMENTS: &str = "/api/appointments";
    pub const DOCTOR_SCHEDULE: &str = "/api/appointments/doctor/:doctor_id/schedule";
    pub const APPOINTMENT_BY_ID: &str = "/api/appointments/:id";
    pub const CANCEL: &str = "/api/appointments/:id/cancel";
    pub const STATUS: &str = "/api/appointments/:id/status";
    pub const RESCHEDULE: &str = "/api/appointments/:id/reschedule";
}

/// Leave request endpoints
pub mod leaves {
    pub const APPLY: &str = "/api/leaves/apply";
    pub const MY: &str = "/api/leaves/my";
    pub const ALL: &str = "/api/leaves/all";
    pub const LEAVE_BY_ID: &str = "/api/leaves/:id";
    pub const APPROVE: &str = "/api/leaves/:id/approve";
    pub const REJECT: &str = "/api/leaves/:id/reject";
}

/// Expense and income ledger endpoints
pub mod ledger {
    pub const EXPENSE_ADD: &str = "/api/v1/expense/add";
    pub const EXPENSE_GET: &str = "/api/v1/expense/get";
    pub const EXPENSE_BY_ID: &str = "/api/v1/expense/:id";
    pub const EXPENSE_DOWNLOAD: &str = "/api/v1/expense/download";
    pub const INCOME_ADD: &str = "/api/v1/income/add";
    pub const INCOME_GET: &str = "/api/v1/income/get";
    pub const INCOME_BY_ID: &str = "/api/v1/income/:id";
    pub const INCOME_DOWNLOAD: &str = "/api/v1/income/download";
    pub const DASHBOARD: &str = "/api/v1/dashboard";
}
