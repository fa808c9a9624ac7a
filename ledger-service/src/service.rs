use chrono::Utc;
use error_common::FieldErrors;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::dashboard::Dashboard;
use crate::error::{LedgerError, Result};
use crate::export::{render_csv, CsvExport};
use crate::models::{EntryKind, LedgerEntry, NewEntry};
use crate::store::LedgerStore;

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, kind: EntryKind, request: NewEntry, user_id: Uuid) -> Result<LedgerEntry> {
        let valid = request.check(kind)?;
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id,
            kind,
            label: valid.label,
            icon: valid.icon,
            amount: valid.amount,
            date: valid.date,
            created_at: Utc::now(),
        };
        let entry = self.store.create(&entry).await?;
        info!(entry_id = %entry.id, kind = %kind, "Ledger entry added");
        Ok(entry)
    }

    pub async fn list(&self, kind: EntryKind, user_id: Uuid) -> Result<Vec<LedgerEntry>> {
        self.store.list(user_id, kind).await
    }

    /// `raw_id` comes straight from the path so a malformed id can be told
    /// apart from a missing one
    pub async fn delete(&self, kind: EntryKind, raw_id: &str, user_id: Uuid) -> Result<()> {
        let id = Uuid::parse_str(raw_id).map_err(|_| {
            FieldErrors::single("id", format!("Invalid {} ID format", kind.as_str()))
        })?;
        if !self.store.delete_owned(id, user_id, kind).await? {
            return Err(LedgerError::NotFound(kind));
        }
        info!(entry_id = %id, kind = %kind, "Ledger entry deleted");
        Ok(())
    }

    pub async fn download(&self, kind: EntryKind, user_id: Uuid) -> Result<CsvExport> {
        let entries = self.store.list(user_id, kind).await?;
        debug!(kind = %kind, rows = entries.len(), "Rendering ledger export");
        Ok(render_csv(kind, &entries))
    }

    pub async fn dashboard(&self, user_id: Uuid) -> Result<Dashboard> {
        let expenses = self.store.list(user_id, EntryKind::Expense).await?;
        let income = self.store.list(user_id, EntryKind::Income).await?;
        Ok(Dashboard::compute(&expenses, &income, Utc::now().date_naive()))
    }
}
