//! Appointment scheduling for Carebook Engine
//!
//! Appointments receive an `APT######` identity at booking. A doctor can hold
//! only one live appointment per date and time; cancelled and completed
//! appointments release the slot. Status changes follow the table in
//! [`status`], and every reschedule leaves an entry in the history.

pub mod error;
pub mod models;
pub mod postgres;
pub mod service;
pub mod status;
pub mod store;
pub mod timing;

pub use error::*;
pub use models::*;
pub use postgres::*;
pub use service::*;
pub use status::*;
pub use store::*;
