//! Personal expense and income ledger for Carebook Engine
//!
//! Entries are private to their owner. Amounts are coerced to positive
//! decimals when written, so the [`Dashboard`] never sees bad data.

pub mod dashboard;
pub mod error;
pub mod export;
pub mod models;
pub mod postgres;
pub mod service;
pub mod store;

pub use dashboard::*;
pub use error::*;
pub use export::*;
pub use models::*;
pub use postgres::*;
pub use service::*;
pub use store::*;
