//! Identity management for Carebook Engine
//!
//! Accounts carry a single [`Role`]; route guards in the server decide access
//! from it. Passwords are hashed with Argon2id and sessions are stateless
//! HS256 bearer tokens.

pub mod config;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod tokens;

pub use config::*;
pub use error::*;
pub use models::*;
pub use postgres::*;
pub use repository::*;
pub use service::*;
pub use tokens::*;
