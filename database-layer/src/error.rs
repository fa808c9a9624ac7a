use thiserror::Error;

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl DatabaseError {
    /// True when the failure is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::SqlxError(sqlx::Error::Database(db)) => {
                db.code().as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }

    /// Name of the violated constraint, when the driver reports one
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DatabaseError::SqlxError(sqlx::Error::Database(db)) => db.constraint(),
            _ => None,
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationError(err.to_string())
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
