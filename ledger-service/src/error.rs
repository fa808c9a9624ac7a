use database_layer::DatabaseError;
use error_common::FieldErrors;
use thiserror::Error;

use crate::models::EntryKind;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("{} not found or unauthorized", .0.title())]
    NotFound(EntryKind),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Database(DatabaseError::from(err))
    }
}

impl From<FieldErrors> for LedgerError {
    fn from(errors: FieldErrors) -> Self {
        LedgerError::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
