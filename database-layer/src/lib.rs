//! Database layer for Carebook Engine
//!
//! - [`DatabasePool`]: PostgreSQL connection pool with health checks,
//!   transactions and the embedded schema migrations (`migrations/`)
//! - [`SequenceAllocator`]: atomic per-prefix counters behind the
//!   `PAT######` / `APT######` record identities
//! - [`PageRequest`] / [`PageInfo`]: page arithmetic for list endpoints
//! - [`encode_label`] / [`decode_label`]: enum ↔ text column mapping
//! - [`DatabaseError`]: driver failures, including detection of unique-key
//!   violations so callers can report them as conflicts

pub mod codec;
pub mod connection;
pub mod error;
pub mod paging;
pub mod sequence;

pub use codec::*;
pub use connection::*;
pub use error::*;
pub use paging::*;
pub use sequence::*;
