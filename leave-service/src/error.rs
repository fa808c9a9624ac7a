use auth_identity::IdentityError;
use database_layer::DatabaseError;
use error_common::FieldErrors;
use thiserror::Error;

use crate::lifecycle::DecisionRejected;

#[derive(Error, Debug)]
pub enum LeaveError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Leave not found")]
    NotFound,

    #[error("Only pending leaves can be cancelled")]
    NotPending,

    #[error("Not authorized")]
    NotOwner,

    #[error(transparent)]
    InvalidDecision(#[from] DecisionRejected),

    #[error("User lookup failed: {0}")]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for LeaveError {
    fn from(err: sqlx::Error) -> Self {
        LeaveError::Database(DatabaseError::from(err))
    }
}

impl From<FieldErrors> for LeaveError {
    fn from(errors: FieldErrors) -> Self {
        LeaveError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, LeaveError>;
