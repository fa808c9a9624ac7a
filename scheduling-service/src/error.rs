use auth_identity::IdentityError;
use database_layer::DatabaseError;
use error_common::FieldErrors;
use patient_service::PatientError;
use thiserror::Error;

use crate::status::TransitionRejected;

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not available at this time slot")]
    SlotConflict,

    #[error("Appointment ID {0} already exists")]
    DuplicateIdentity(String),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionRejected),

    #[error("Patient lookup failed: {0}")]
    Patients(#[from] PatientError),

    #[error("User lookup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for SchedulingError {
    fn from(err: sqlx::Error) -> Self {
        SchedulingError::Database(DatabaseError::from(err))
    }
}

impl From<FieldErrors> for SchedulingError {
    fn from(errors: FieldErrors) -> Self {
        SchedulingError::Validation(errors)
    }
}

impl From<validator::ValidationErrors> for SchedulingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        SchedulingError::Validation(errors.into())
    }
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
