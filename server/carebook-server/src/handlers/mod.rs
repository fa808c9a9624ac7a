pub mod appointments;
pub mod auth;
pub mod health;
pub mod leaves;
pub mod ledger;
pub mod patients;
