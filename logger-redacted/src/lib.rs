//! Logging setup with automatic PII redaction
//!
//! Patient and ledger records carry contact details that must not end up in
//! log files verbatim. This crate installs the global `tracing` subscriber and
//! provides [`PiiRedactor`] for scrubbing free text before it is logged.
//!
//! # Detected Data Types
//!
//! - **Email Addresses**: user@example.com → u***@e***
//! - **Phone Numbers**: (555) 123-4567 → (***) ***-****
//! - **SSN**: 123-45-6789 → ***-**-****
//! - **IP Addresses**: 192.168.1.1 → 192.***.***.1
//! - **Custom Patterns**: configurable organization-specific patterns
//!
//! With `hash_for_correlation` enabled (the default) matches are replaced by a
//! short hash instead, so the same value can be correlated across log lines.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{PiiRedactor, RedactionConfig};
//!
//! let redactor = PiiRedactor::new(RedactionConfig::default()).unwrap();
//! let line = redactor.redact("Lookup for john.doe@example.com");
//! assert!(!line.contains("john.doe"));
//! ```

pub mod config;
pub mod redactor;
pub mod subscriber;

pub use config::*;
pub use redactor::*;
pub use subscriber::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid redaction pattern: {0}")]
    InvalidPattern(String),

    #[error("Tracing subscriber already initialized: {0}")]
    AlreadyInitialized(String),
}
