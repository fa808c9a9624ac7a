use database_layer::DatabaseError;
use error_common::FieldErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Patient not found")]
    NotFound,

    #[error("Patient ID {0} already exists")]
    DuplicateIdentity(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for PatientError {
    fn from(err: sqlx::Error) -> Self {
        PatientError::Database(DatabaseError::from(err))
    }
}

impl From<validator::ValidationErrors> for PatientError {
    fn from(errors: validator::ValidationErrors) -> Self {
        PatientError::Validation(errors.into())
    }
}

pub type Result<T> = std::result::Result<T, PatientError>;
