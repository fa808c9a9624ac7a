use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use database_layer::{decode_label, DatabasePool};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::models::{EntryKind, LedgerEntry};
use crate::store::LedgerStore;

const ENTRY_COLUMNS: &str = "id, user_id, kind, label, icon, amount, entry_date, created_at";

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    label: String,
    icon: Option<String>,
    amount: Decimal,
    entry_date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(row: EntryRow) -> Result<Self> {
        Ok(LedgerEntry {
            id: row.id,
            user_id: row.user_id,
            kind: decode_label(&row.kind)?,
            label: row.label,
            icon: row.icon,
            amount: row.amount,
            date: row.entry_date,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL-backed ledger; both kinds share `ledger_entries`
pub struct PgLedgerStore {
    db: DatabasePool,
}

impl PgLedgerStore {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn create(&self, entry: &LedgerEntry) -> Result<LedgerEntry> {
        let row: EntryRow = sqlx::query_as(&format!(
            "INSERT INTO ledger_entries ({ENTRY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.kind.as_str())
        .bind(&entry.label)
        .bind(&entry.icon)
        .bind(entry.amount)
        .bind(entry.date)
        .bind(entry.created_at)
        .fetch_one(self.db.pool())
        .await?;
        row.try_into()
    }

    async fn list(&self, user_id: Uuid, kind: EntryKind) -> Result<Vec<LedgerEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries \
             WHERE user_id = $1 AND kind = $2 \
             ORDER BY entry_date DESC, created_at DESC"
        ))
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid, kind: EntryKind) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM ledger_entries WHERE id = $1 AND user_id = $2 AND kind = $3")
                .bind(id)
                .bind(user_id)
                .bind(kind.as_str())
                .execute(self.db.pool())
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
