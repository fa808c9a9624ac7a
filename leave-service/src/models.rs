use auth_identity::UserSummary;
use chrono::{DateTime, NaiveDate, Utc};
use error_common::FieldErrors;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::lifecycle::LeaveStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Casual,
    Earned,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    /// Who approved or rejected the request
    pub approved_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// `POST /api/leaves/apply` body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(max = 1000, message = "Reason is too long"))]
    pub reason: Option<String>,
}

impl ApplyLeave {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if self.end_date < self.start_date {
            errors.add("endDate", "End date cannot be before start date");
        }
        errors.into_result()
    }
}

/// Leave request with the employee and approver accounts stitched in
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveView {
    #[serde(flatten)]
    pub leave: LeaveRequest,
    pub employee: Option<UserSummary>,
    pub approver: Option<UserSummary>,
    pub days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn end_before_start_is_a_field_error() {
        let request: ApplyLeave = serde_json::from_value(json!({
            "leaveType": "sick",
            "startDate": "2024-03-10",
            "endDate": "2024-03-08"
        }))
        .unwrap();
        let errors = request.check().unwrap_err();
        assert!(errors.get("endDate").is_some());
    }

    #[test]
    fn single_day_leave_is_valid() {
        let request: ApplyLeave = serde_json::from_value(json!({
            "leaveType": "casual",
            "startDate": "2024-03-10",
            "endDate": "2024-03-10",
            "reason": "Moving house"
        }))
        .unwrap();
        assert!(request.check().is_ok());
    }

    #[test]
    fn unknown_leave_type_is_rejected() {
        let result = serde_json::from_value::<ApplyLeave>(json!({
            "leaveType": "sabbatical",
            "startDate": "2024-03-10",
            "endDate": "2024-03-12"
        }));
        assert!(result.is_err());
    }
}
