use thiserror::Error;

/// Process-level error for binaries and bootstrap code
#[derive(Error, Debug)]
pub enum CarebookError {
    /// Network communication errors
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server runtime errors
    #[error("Server error: {0}")]
    ServerError(String),

    /// Database bootstrap errors
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal system errors
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Carebook operations
pub type Result<T> = std::result::Result<T, CarebookError>;

/// Log an error with the context it occurred in
pub fn log_error(context: &str, error: &CarebookError) {
    tracing::error!(
        context = context,
        error = %error,
        "Carebook error occurred"
    );
}
