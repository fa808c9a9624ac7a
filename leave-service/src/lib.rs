//! Employee leave requests for Carebook Engine
//!
//! Employees apply for and withdraw their own requests; managers and admins
//! decide them. See [`lifecycle`] for the allowed moves.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod postgres;
pub mod service;
pub mod store;

pub use error::*;
pub use lifecycle::{Decision, DecisionRejected, LeaveStatus, Outcome};
pub use models::*;
pub use postgres::*;
pub use service::*;
pub use store::*;
