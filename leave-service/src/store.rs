use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::lifecycle::LeaveStatus;
use crate::models::LeaveRequest;

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn create(&self, leave: &LeaveRequest) -> Result<LeaveRequest>;
    async fn get(&self, id: Uuid) -> Result<Option<LeaveRequest>>;
    /// One employee's requests, newest first
    async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<LeaveRequest>>;
    /// Every request, newest first
    async fn list_all(&self) -> Result<Vec<LeaveRequest>>;
    /// Record a decision on a request that is still pending. Returns `None`
    /// when the request is gone or no longer pending.
    async fn record_decision(
        &self,
        id: Uuid,
        status: LeaveStatus,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<LeaveRequest>>;
    /// Physically remove a request that is still pending. Returns whether a
    /// row was removed.
    async fn delete_pending(&self, id: Uuid) -> Result<bool>;
}

fn newest_first(leaves: &mut [LeaveRequest]) {
    leaves.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// In-memory implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryLeaveStore {
    leaves: Arc<RwLock<HashMap<Uuid, LeaveRequest>>>,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn create(&self, leave: &LeaveRequest) -> Result<LeaveRequest> {
        self.leaves.write().await.insert(leave.id, leave.clone());
        Ok(leave.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        Ok(self.leaves.read().await.get(&id).cloned())
    }

    async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<LeaveRequest>> {
        let mut leaves: Vec<LeaveRequest> = self
            .leaves
            .read()
            .await
            .values()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect();
        newest_first(&mut leaves);
        Ok(leaves)
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>> {
        let mut leaves: Vec<LeaveRequest> = self.leaves.read().await.values().cloned().collect();
        newest_first(&mut leaves);
        Ok(leaves)
    }

    async fn record_decision(
        &self,
        id: Uuid,
        status: LeaveStatus,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<LeaveRequest>> {
        let mut leaves = self.leaves.write().await;
        match leaves.get_mut(&id) {
            Some(leave) if leave.status == LeaveStatus::Pending => {
                leave.status = status;
                leave.approved_by = Some(approver);
                leave.decided_at = Some(at);
                leave.updated_at = at;
                Ok(Some(leave.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_pending(&self, id: Uuid) -> Result<bool> {
        let mut leaves = self.leaves.write().await;
        if leaves.get(&id).is_some_and(|l| l.status.is_cancellable()) {
            leaves.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::leave;
    use chrono::Duration;

    #[tokio::test]
    async fn listings_are_newest_first() {
        let store = InMemoryLeaveStore::new();
        let employee = Uuid::new_v4();
        let mut older = leave(employee);
        older.created_at -= Duration::hours(2);
        store.create(&older).await.unwrap();
        let newer = store.create(&leave(employee)).await.unwrap();
        store.create(&leave(Uuid::new_v4())).await.unwrap();

        let mine = store.list_for_employee(employee).await.unwrap();
        assert_eq!(mine.iter().map(|l| l.id).collect::<Vec<_>>(), vec![newer.id, older.id]);
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn decided_request_is_neither_decided_again_nor_deleted() {
        let store = InMemoryLeaveStore::new();
        let request = store.create(&leave(Uuid::new_v4())).await.unwrap();
        let approver = Uuid::new_v4();

        let approved = store
            .record_decision(request.id, LeaveStatus::Approved, approver, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.approved_by, Some(approver));

        let again = store
            .record_decision(request.id, LeaveStatus::Rejected, approver, Utc::now())
            .await
            .unwrap();
        assert!(again.is_none());
        assert!(!store.delete_pending(request.id).await.unwrap());
        assert!(store.get(request.id).await.unwrap().is_some());
    }
}
