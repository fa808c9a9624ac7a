use database_layer::DatabaseError;
use error_common::FieldErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailAlreadyInUse,

    #[error("Not authorized, token failed: {0}")]
    InvalidToken(String),

    #[error("Hashing error")]
    HashingError,

    #[error("Identity configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        IdentityError::Database(DatabaseError::from(err))
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(errors: validator::ValidationErrors) -> Self {
        IdentityError::Validation(errors.into())
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
