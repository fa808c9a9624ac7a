use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{EntryKind, LedgerEntry};

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn create(&self, entry: &LedgerEntry) -> Result<LedgerEntry>;
    /// A user's entries of one kind, latest date first
    async fn list(&self, user_id: Uuid, kind: EntryKind) -> Result<Vec<LedgerEntry>>;
    /// Remove the entry if it exists, is of `kind` and belongs to `user_id`
    async fn delete_owned(&self, id: Uuid, user_id: Uuid, kind: EntryKind) -> Result<bool>;
}

/// In-memory implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    entries: Arc<RwLock<HashMap<Uuid, LedgerEntry>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create(&self, entry: &LedgerEntry) -> Result<LedgerEntry> {
        self.entries.write().await.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn list(&self, user_id: Uuid, kind: EntryKind) -> Result<Vec<LedgerEntry>> {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id && e.kind == kind)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(entries)
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid, kind: EntryKind) -> Result<bool> {
        let mut entries = self.entries.write().await;
        if entries
            .get(&id)
            .is_some_and(|e| e.user_id == user_id && e.kind == kind)
        {
            entries.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}
