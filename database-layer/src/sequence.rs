//! Human-readable record identities (`PAT000042`, `APT000007`)
//!
//! Each prefix owns a monotonically increasing counter. Values are handed out
//! atomically, so two concurrent creations never observe the same number; the
//! generated column additionally carries a unique constraint.

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgConnection;
use std::sync::Arc;

use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};

/// Zero-padded width of the numeric part
pub const IDENTITY_WIDTH: usize = 6;

/// Prefix for patient identities
pub const PATIENT_PREFIX: &str = "PAT";
/// Prefix for appointment identities
pub const APPOINTMENT_PREFIX: &str = "APT";

/// `PREFIX` followed by the zero-padded sequence value
pub fn format_identity(prefix: &str, value: i64) -> String {
    format!("{prefix}{value:0width$}", width = IDENTITY_WIDTH)
}

/// Numeric part of an identity carrying `prefix`, if well formed
pub fn parse_identity(prefix: &str, identity: &str) -> Option<i64> {
    let digits = identity.strip_prefix(prefix)?;
    if digits.len() < IDENTITY_WIDTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

pub fn is_valid_identity(prefix: &str, identity: &str) -> bool {
    parse_identity(prefix, identity).is_some()
}

/// Source of sequence values, one counter per name
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Reserve and return the next value of `name` (first value is 1)
    async fn next_value(&self, name: &str) -> DatabaseResult<i64>;

    /// Reserve the next value and render it as an identity
    async fn next_identity(&self, prefix: &str) -> DatabaseResult<String> {
        let value = self.next_value(prefix).await?;
        Ok(format_identity(prefix, value))
    }
}

const NEXT_VALUE_SQL: &str = r"
    INSERT INTO identity_sequences (name, value)
    VALUES ($1, 1)
    ON CONFLICT (name) DO UPDATE SET value = identity_sequences.value + 1
    RETURNING value
";

/// Counter rows in `identity_sequences`, advanced with a single upsert
#[derive(Clone, Debug)]
pub struct PgSequenceAllocator {
    pool: DatabasePool,
}

impl PgSequenceAllocator {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Advance the counter on an existing connection, typically inside the
    /// transaction that inserts the record.
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn next_value_on(conn: &mut PgConnection, name: &str) -> DatabaseResult<i64> {
        let value: i64 = sqlx::query_scalar(NEXT_VALUE_SQL)
            .bind(name)
            .fetch_one(conn)
            .await?;
        Ok(value)
    }

    /// Like [`Self::next_value_on`], rendered as an identity
    ///
    /// # Errors
    ///
    /// Propagates driver failures.
    pub async fn next_identity_on(conn: &mut PgConnection, prefix: &str) -> DatabaseResult<String> {
        let value = Self::next_value_on(conn, prefix).await?;
        Ok(format_identity(prefix, value))
    }
}

#[async_trait]
impl SequenceAllocator for PgSequenceAllocator {
    async fn next_value(&self, name: &str) -> DatabaseResult<i64> {
        let mut conn = self.pool.pool().acquire().await?;
        Self::next_value_on(&mut conn, name).await
    }
}

/// Process-local counters for the in-memory backend
#[derive(Clone, Debug, Default)]
pub struct InMemorySequenceAllocator {
    counters: Arc<DashMap<String, i64>>,
}

impl InMemorySequenceAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceAllocator for InMemorySequenceAllocator {
    async fn next_value(&self, name: &str) -> DatabaseResult<i64> {
        // The entry guard holds the shard lock for the increment
        let mut counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| DatabaseError::QueryFailed(format!("sequence {name} exhausted")))?;
        Ok(*counter)
    }
}
