//! Leave request lifecycle.
//!
//! A request starts `pending` and is decided once, to `approved` or
//! `rejected`. Repeating the decision it already carries is a no-op; the
//! opposite decision is refused. Only pending requests can be withdrawn.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }

    pub fn is_cancellable(self) -> bool {
        self == LeaveStatus::Pending
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn target(self) -> LeaveStatus {
        match self {
            Decision::Approve => LeaveStatus::Approved,
            Decision::Reject => LeaveStatus::Rejected,
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request moves to this status
    Changed(LeaveStatus),
    /// The request already carries the decision
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Cannot {} a leave that is already {from}", .decision.verb())]
pub struct DecisionRejected {
    pub from: LeaveStatus,
    pub decision: Decision,
}

/// # Errors
///
/// Returns [`DecisionRejected`] when the request was already given the
/// opposite decision.
pub fn decide(current: LeaveStatus, decision: Decision) -> Result<Outcome, DecisionRejected> {
    let target = decision.target();
    match current {
        LeaveStatus::Pending => Ok(Outcome::Changed(target)),
        from if from == target => Ok(Outcome::Unchanged),
        from => Err(DecisionRejected { from, decision }),
    }
}
