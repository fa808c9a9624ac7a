//! Common error handling utilities for Carebook Engine
//!
//! Shared by every crate in the workspace:
//!
//! - **`CarebookError`**: process-level failures (configuration, network, server)
//!   surfaced by binaries and bootstrap code
//! - **`FieldErrors`**: a field → messages map produced by declarative request
//!   validation and carried unchanged to the HTTP error body
//! - **Error codes**: stable string codes attached to API error responses
//!
//! # Example
//!
//! ```rust
//! use error_common::FieldErrors;
//!
//! let mut errors = FieldErrors::new();
//! errors.add("contactInfo.phone", "Phone number is required");
//! assert!(!errors.is_empty());
//! ```

pub mod codes;
pub mod fields;
pub mod types;

pub use fields::*;
pub use types::*;
