use auth_identity::{UserRepository, UserSummary};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::*, lifecycle::*, models::*, store::LeaveStore};

#[derive(Clone)]
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    users: Arc<dyn UserRepository>,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, users: Arc<dyn UserRepository>) -> Self {
        Self { store, users }
    }

    pub async fn apply(&self, request: ApplyLeave, employee: Uuid) -> Result<LeaveView> {
        request.check()?;
        let now = Utc::now();
        let leave = LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: employee,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            status: LeaveStatus::Pending,
            approved_by: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        };
        let leave = self.store.create(&leave).await?;
        info!(leave_id = %leave.id, employee_id = %employee, days = leave.days(), "Leave requested");
        self.view(leave).await
    }

    pub async fn mine(&self, employee: Uuid) -> Result<Vec<LeaveView>> {
        let leaves = self.store.list_for_employee(employee).await?;
        self.views(leaves).await
    }

    pub async fn all(&self) -> Result<Vec<LeaveView>> {
        let leaves = self.store.list_all().await?;
        self.views(leaves).await
    }

    /// Withdraw a pending request. Existence is checked first, then the
    /// status, then ownership.
    pub async fn cancel(&self, id: Uuid, actor: Uuid) -> Result<()> {
        let leave = self.store.get(id).await?.ok_or(LeaveError::NotFound)?;
        if !leave.status.is_cancellable() {
            return Err(LeaveError::NotPending);
        }
        if leave.employee_id != actor {
            warn!(leave_id = %id, actor = %actor, "Refused to cancel another employee's leave");
            return Err(LeaveError::NotOwner);
        }
        if !self.store.delete_pending(id).await? {
            // Decided or removed since it was read
            return match self.store.get(id).await? {
                Some(_) => Err(LeaveError::NotPending),
                None => Err(LeaveError::NotFound),
            };
        }
        info!(leave_id = %id, "Leave cancelled");
        Ok(())
    }

    pub async fn approve(&self, id: Uuid, approver: Uuid) -> Result<LeaveView> {
        self.decide(id, Decision::Approve, approver).await
    }

    pub async fn reject(&self, id: Uuid, approver: Uuid) -> Result<LeaveView> {
        self.decide(id, Decision::Reject, approver).await
    }

    async fn decide(&self, id: Uuid, decision: Decision, approver: Uuid) -> Result<LeaveView> {
        let leave = self.store.get(id).await?.ok_or(LeaveError::NotFound)?;
        let status = match crate::lifecycle::decide(leave.status, decision)? {
            Outcome::Unchanged => return self.view(leave).await,
            Outcome::Changed(status) => status,
        };

        let decided = match self.store.record_decision(id, status, approver, Utc::now()).await? {
            Some(decided) => decided,
            // Another reviewer got there first; judge against what they stored
            None => {
                let current = self.store.get(id).await?.ok_or(LeaveError::NotFound)?;
                crate::lifecycle::decide(current.status, decision)?;
                return self.view(current).await;
            }
        };
        info!(leave_id = %id, status = %decided.status, approver = %approver, "Leave decided");
        self.view(decided).await
    }

    async fn view(&self, leave: LeaveRequest) -> Result<LeaveView> {
        let mut views = self.views(vec![leave]).await?;
        views.pop().ok_or(LeaveError::NotFound)
    }

    async fn views(&self, leaves: Vec<LeaveRequest>) -> Result<Vec<LeaveView>> {
        let ids: Vec<Uuid> = leaves
            .iter()
            .flat_map(|l| std::iter::once(l.employee_id).chain(l.approved_by))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let users: HashMap<Uuid, UserSummary> = self
            .users
            .find_many(&ids)
            .await?
            .iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();

        Ok(leaves
            .into_iter()
            .map(|leave| LeaveView {
                employee: users.get(&leave.employee_id).cloned(),
                approver: leave.approved_by.and_then(|a| users.get(&a).cloned()),
                days: leave.days(),
                leave,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Harness;

    #[tokio::test]
    async fn applied_leave_is_pending_and_listed_for_its_owner() {
        let h = Harness::new().await;
        let view = h.service.apply(h.request(), h.employee).await.unwrap();
        assert_eq!(view.leave.status, LeaveStatus::Pending);
        assert_eq!(view.days, 3);
        assert_eq!(view.employee.as_ref().map(|e| e.id), Some(h.employee));
        assert!(view.approver.is_none());

        assert_eq!(h.service.mine(h.employee).await.unwrap().len(), 1);
        assert!(h.service.mine(h.manager).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn owner_can_cancel_a_pending_leave() {
        let h = Harness::new().await;
        let view = h.service.apply(h.request(), h.employee).await.unwrap();
        h.service.cancel(view.leave.id, h.employee).await.unwrap();
        assert!(h.service.mine(h.employee).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approved_leave_cannot_be_cancelled() {
        let h = Harness::new().await;
        let view = h.service.apply(h.request(), h.employee).await.unwrap();
        h.service.approve(view.leave.id, h.manager).await.unwrap();

        let result = h.service.cancel(view.leave.id, h.employee).await;
        assert!(matches!(result, Err(LeaveError::NotPending)));
    }

    #[tokio::test]
    async fn cancel_checks_existence_then_status_then_owner() {
        let h = Harness::new().await;
        let result = h.service.cancel(Uuid::new_v4(), h.employee).await;
        assert!(matches!(result, Err(LeaveError::NotFound)));

        let view = h.service.apply(h.request(), h.employee).await.unwrap();
        let result = h.service.cancel(view.leave.id, h.manager).await;
        assert!(matches!(result, Err(LeaveError::NotOwner)));

        h.service.reject(view.leave.id, h.manager).await.unwrap();
        // Not pending wins over not owner
        let result = h.service.cancel(view.leave.id, h.manager).await;
        assert!(matches!(result, Err(LeaveError::NotPending)));
    }

    #[tokio::test]
    async fn approving_twice_is_a_no_op() {
        let h = Harness::new().await;
        let view = h.service.apply(h.request(), h.employee).await.unwrap();

        let first = h.service.approve(view.leave.id, h.manager).await.unwrap();
        assert_eq!(first.leave.status, LeaveStatus::Approved);
        assert_eq!(first.approver.as_ref().map(|a| a.id), Some(h.manager));

        let second = h.service.approve(view.leave.id, h.admin).await.unwrap();
        assert_eq!(second.leave, first.leave);
    }

    #[tokio::test]
    async fn opposite_decision_is_a_conflict() {
        let h = Harness::new().await;
        let view = h.service.apply(h.request(), h.employee).await.unwrap();
        h.service.reject(view.leave.id, h.manager).await.unwrap();

        let result = h.service.approve(view.leave.id, h.manager).await;
        assert!(matches!(result, Err(LeaveError::InvalidDecision(_))));
    }

    #[tokio::test]
    async fn all_includes_every_employee() {
        let h = Harness::new().await;
        h.service.apply(h.request(), h.employee).await.unwrap();
        h.service.apply(h.request(), h.manager).await.unwrap();
        assert_eq!(h.service.all().await.unwrap().len(), 2);
    }
}
