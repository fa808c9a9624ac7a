use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use database_layer::{decode_label, encode_label, DatabasePool};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{LeaveError, Result};
use crate::lifecycle::LeaveStatus;
use crate::models::LeaveRequest;
use crate::store::LeaveStore;

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, reason, status, \
     approved_by, decided_at, created_at, updated_at";

#[derive(Debug, FromRow)]
struct LeaveRow {
    id: Uuid,
    employee_id: Uuid,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: Option<String>,
    status: String,
    approved_by: Option<Uuid>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRow) -> Result<Self> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: decode_label(&row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status: decode_label(&row.status)?,
            approved_by: row.approved_by,
            decided_at: row.decided_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_leaves(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRequest>> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

/// PostgreSQL-backed leave store
pub struct PgLeaveStore {
    db: DatabasePool,
}

impl PgLeaveStore {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LeaveStore for PgLeaveStore {
    async fn create(&self, leave: &LeaveRequest) -> Result<LeaveRequest> {
        let row: LeaveRow = sqlx::query_as(&format!(
            "INSERT INTO leave_requests ({LEAVE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(leave.id)
        .bind(leave.employee_id)
        .bind(encode_label(&leave.leave_type)?)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(&leave.reason)
        .bind(leave.status.as_str())
        .bind(leave.approved_by)
        .bind(leave.decided_at)
        .bind(leave.created_at)
        .bind(leave.updated_at)
        .fetch_one(self.db.pool())
        .await?;
        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        let row: Option<LeaveRow> =
            sqlx::query_as(&format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn list_for_employee(&self, employee_id: Uuid) -> Result<Vec<LeaveRequest>> {
        let rows: Vec<LeaveRow> = sqlx::query_as(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE employee_id = $1 ORDER BY created_at DESC"
        ))
        .bind(employee_id)
        .fetch_all(self.db.pool())
        .await?;
        into_leaves(rows)
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>> {
        let rows: Vec<LeaveRow> = sqlx::query_as(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests ORDER BY created_at DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;
        into_leaves(rows)
    }

    async fn record_decision(
        &self,
        id: Uuid,
        status: LeaveStatus,
        approver: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<LeaveRequest>> {
        let row: Option<LeaveRow> = sqlx::query_as(&format!(
            "UPDATE leave_requests \
             SET status = $2, approved_by = $3, decided_at = $4, updated_at = $4 \
             WHERE id = $1 AND status = 'pending' \
             RETURNING {LEAVE_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(approver)
        .bind(at)
        .fetch_optional(self.db.pool())
        .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn delete_pending(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
