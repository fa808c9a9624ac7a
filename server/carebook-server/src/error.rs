use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use database_layer::DatabaseError;
use error_common::{codes, FieldErrors};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use auth_identity::IdentityError;
use leave_service::LeaveError;
use ledger_service::LedgerError;
use patient_service::PatientError;
use scheduling_service::SchedulingError;

/// Internal detail of a 5xx response. It rides in the response extensions
/// and is written into the body by
/// [`error_details_middleware`](crate::middleware::error_details_middleware)
/// when the server exposes it.
#[derive(Debug, Clone)]
pub struct InternalDetails(pub String);

/// Standard API error response structure
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub success: bool,
    /// Unique error ID for tracking
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Stable machine-readable code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub field_errors: Option<FieldErrors>,
    /// Internal detail, outside production only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        message: None,
        data,
    }
}

pub fn api_message<T>(message: impl Into<String>, data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        message: Some(message.into()),
        data,
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<FieldErrors>,
    },

    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Authorization { message: String },

    #[error("{message}")]
    NotFound { message: String },

    /// Double-booked slot, duplicate identity or an illegal lifecycle move
    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("Internal server error")]
    Internal { details: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn fields(errors: FieldErrors) -> Self {
        Self::Validation {
            message: errors
                .first_message()
                .unwrap_or("Validation failed")
                .to_string(),
            field_errors: Some(errors),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::Internal {
            details: details.into(),
        }
    }

    /// Conflicts are reported as 400 like every other client mistake
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::Conflict { .. } | ApiError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => codes::validation::INVALID_INPUT,
            ApiError::Authentication { .. } => codes::authentication::TOKEN_INVALID,
            ApiError::Authorization { .. } => codes::authorization::ACCESS_DENIED,
            ApiError::NotFound { .. } => codes::resource::NOT_FOUND,
            ApiError::Conflict { .. } => codes::resource::CONFLICT,
            ApiError::Internal { .. } => codes::system::INTERNAL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        if status_code.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = ?self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let error_type = self.error_type().to_string();
        let code = self.code().to_string();
        let message = self.to_string();
        let (field_errors, details) = match self {
            ApiError::Validation { field_errors, .. } => (field_errors, None),
            ApiError::Internal { details } => (None, Some(InternalDetails(details))),
            _ => (None, None),
        };

        let body = ApiErrorResponse {
            success: false,
            error_id,
            error_type,
            code,
            message,
            field_errors,
            details: None,
            timestamp: chrono::Utc::now(),
        };

        let mut response = (status_code, Json(body)).into_response();
        if let Some(details) = details {
            response.extensions_mut().insert(details);
        }
        response
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::fields(errors)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unique_violation() {
            return ApiError::conflict("A record with these details already exists");
        }
        ApiError::internal(err.to_string())
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation(errors) => errors.into(),
            IdentityError::UserNotFound => ApiError::not_found(err.to_string()),
            IdentityError::InvalidCredentials | IdentityError::InvalidToken(_) => {
                ApiError::authentication(err.to_string())
            }
            IdentityError::EmailAlreadyInUse => ApiError::conflict(err.to_string()),
            IdentityError::Database(db) => db.into(),
            IdentityError::HashingError | IdentityError::Configuration(_) => {
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<PatientError> for ApiError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::Validation(errors) => errors.into(),
            PatientError::NotFound => ApiError::not_found(err.to_string()),
            PatientError::DuplicateIdentity(_) => ApiError::conflict(err.to_string()),
            PatientError::Database(db) => db.into(),
        }
    }
}

impl From<SchedulingError> for ApiError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(errors) => errors.into(),
            SchedulingError::NotFound
            | SchedulingError::PatientNotFound
            | SchedulingError::DoctorNotFound => ApiError::not_found(err.to_string()),
            SchedulingError::SlotConflict
            | SchedulingError::DuplicateIdentity(_)
            | SchedulingError::InvalidTransition(_) => ApiError::conflict(err.to_string()),
            SchedulingError::Patients(inner) => inner.into(),
            SchedulingError::Identity(inner) => inner.into(),
            SchedulingError::Database(db) => db.into(),
        }
    }
}

impl From<LeaveError> for ApiError {
    fn from(err: LeaveError) -> Self {
        match err {
            LeaveError::Validation(errors) => errors.into(),
            LeaveError::NotFound => ApiError::not_found(err.to_string()),
            LeaveError::NotPending => ApiError::bad_request(err.to_string()),
            LeaveError::NotOwner => ApiError::authorization(err.to_string()),
            LeaveError::InvalidDecision(_) => ApiError::conflict(err.to_string()),
            LeaveError::Identity(inner) => inner.into(),
            LeaveError::Database(db) => db.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(errors) => errors.into(),
            LedgerError::NotFound(_) => ApiError::not_found(err.to_string()),
            LedgerError::Database(db) => db.into(),
        }
    }
}

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Drop serde_json's trailing ` at line L column C`
fn strip_position(text: &str) -> &str {
    match text.rsplit_once(" at line ") {
        Some((head, position))
            if position
                .split(" column ")
                .all(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit())) =>
        {
            head
        }
        _ => text,
    }
}

fn is_field_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

/// `appointmentType` -> `Appointment type`
fn humanize(field: &str) -> String {
    let mut words = String::with_capacity(field.len() + 4);
    for ch in field.chars() {
        if ch.is_uppercase() && !words.is_empty() {
            words.push(' ');
            words.extend(ch.to_lowercase());
        } else {
            words.push(ch);
        }
    }
    capitalize(&words)
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Field errors from a body that parsed as JSON but did not fit the payload
/// type. The text has the form `[path: ]serde message`, where a missing
/// field names its key inside the message.
pub fn json_field_errors(text: &str) -> Option<FieldErrors> {
    let text = strip_position(text.strip_prefix(JSON_DATA_PREFIX).unwrap_or(text));
    let (path, message) = match text.split_once(": ") {
        Some((path, message)) if is_field_path(path) => (Some(path), message),
        _ => (None, text),
    };

    if let Some(rest) = message.strip_prefix("missing field `") {
        let field = rest.split('`').next().filter(|f| !f.is_empty())?;
        let key = match path {
            Some(path) => format!("{path}.{field}"),
            None => field.to_string(),
        };
        return Some(FieldErrors::single(key, format!("{} is required", humanize(field))));
    }

    path.map(|path| FieldErrors::single(path, capitalize(message)))
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();
        if matches!(rejection, JsonRejection::JsonDataError(_)) {
            if let Some(errors) = json_field_errors(&text) {
                return ApiError::fields(errors);
            }
        }
        ApiError::validation(text)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}
