use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use database_layer::{
    decode_label, encode_label, DatabaseError, DatabasePool, PageRequest, PgSequenceAllocator,
    APPOINTMENT_PREFIX,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{Result, SchedulingError};
use crate::models::{Appointment, AppointmentListQuery, RescheduleEntry};
use crate::status::AppointmentStatus;
use crate::store::AppointmentStore;

/// Partial unique index over live (doctor, date, time) slots
const SLOT_CONSTRAINT: &str = "appointments_doctor_slot_key";

const COLUMNS: [&str; 34] = [
    "id",
    "appointment_id",
    "patient_id",
    "doctor_id",
    "appointment_date",
    "appointment_time",
    "duration_minutes",
    "appointment_type",
    "department",
    "status",
    "priority",
    "reason",
    "notes",
    "symptoms",
    "visit_type",
    "room_number",
    "reminder_sent",
    "insurance_verified",
    "copay_amount",
    "estimated_cost",
    "actual_start_time",
    "actual_end_time",
    "wait_time_minutes",
    "follow_up_required",
    "follow_up_date",
    "follow_up_instructions",
    "cancelled_by",
    "cancellation_reason",
    "cancellation_date",
    "reschedule_history",
    "created_by",
    "last_updated_by",
    "created_at",
    "updated_at",
];

fn column_list() -> String {
    COLUMNS.join(", ")
}

/// `$from, $from+1, ..` up to the last column
fn placeholders(from: usize) -> String {
    (from..=COLUMNS.len())
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: Uuid,
    appointment_id: String,
    patient_id: Uuid,
    doctor_id: Uuid,
    appointment_date: NaiveDate,
    appointment_time: String,
    duration_minutes: i32,
    appointment_type: String,
    department: String,
    status: String,
    priority: String,
    reason: String,
    notes: Option<String>,
    symptoms: Vec<String>,
    visit_type: String,
    room_number: Option<String>,
    reminder_sent: bool,
    insurance_verified: bool,
    copay_amount: Option<Decimal>,
    estimated_cost: Option<Decimal>,
    actual_start_time: Option<DateTime<Utc>>,
    actual_end_time: Option<DateTime<Utc>>,
    wait_time_minutes: Option<i64>,
    follow_up_required: bool,
    follow_up_date: Option<NaiveDate>,
    follow_up_instructions: Option<String>,
    cancelled_by: Option<Uuid>,
    cancellation_reason: Option<String>,
    cancellation_date: Option<DateTime<Utc>>,
    reschedule_history: Json<Vec<RescheduleEntry>>,
    created_by: Uuid,
    last_updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = SchedulingError;

    fn try_from(row: AppointmentRow) -> Result<Self> {
        let duration = u32::try_from(row.duration_minutes).map_err(|_| {
            DatabaseError::QueryFailed(format!(
                "negative duration {} on appointment {}",
                row.duration_minutes, row.appointment_id
            ))
        })?;
        Ok(Appointment {
            id: row.id,
            appointment_id: row.appointment_id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            appointment_date: row.appointment_date,
            appointment_time: row.appointment_time,
            duration,
            appointment_type: decode_label(&row.appointment_type)?,
            department: decode_label(&row.department)?,
            status: decode_label(&row.status)?,
            priority: decode_label(&row.priority)?,
            reason: row.reason,
            notes: row.notes,
            symptoms: row.symptoms,
            visit_type: decode_label(&row.visit_type)?,
            room_number: row.room_number,
            reminder_sent: row.reminder_sent,
            insurance_verified: row.insurance_verified,
            copay_amount: row.copay_amount,
            estimated_cost: row.estimated_cost,
            actual_start_time: row.actual_start_time,
            actual_end_time: row.actual_end_time,
            wait_time: row.wait_time_minutes,
            follow_up_required: row.follow_up_required,
            follow_up_date: row.follow_up_date,
            follow_up_instructions: row.follow_up_instructions,
            cancelled_by: row.cancelled_by,
            cancellation_reason: row.cancellation_reason,
            cancellation_date: row.cancellation_date,
            reschedule_history: row.reschedule_history.0,
            created_by: row.created_by,
            last_updated_by: row.last_updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Bind every column of `a` in [`COLUMNS`] order
fn bind_all<'q>(
    query: Query<'q, Postgres, PgArguments>,
    a: &'q Appointment,
) -> Result<Query<'q, Postgres, PgArguments>> {
    let duration = i32::try_from(a.duration)
        .map_err(|_| DatabaseError::QueryFailed(format!("duration {} out of range", a.duration)))?;
    Ok(query
        .bind(a.id)
        .bind(&a.appointment_id)
        .bind(a.patient_id)
        .bind(a.doctor_id)
        .bind(a.appointment_date)
        .bind(&a.appointment_time)
        .bind(duration)
        .bind(encode_label(&a.appointment_type)?)
        .bind(encode_label(&a.department)?)
        .bind(a.status.as_str())
        .bind(encode_label(&a.priority)?)
        .bind(&a.reason)
        .bind(&a.notes)
        .bind(&a.symptoms)
        .bind(encode_label(&a.visit_type)?)
        .bind(&a.room_number)
        .bind(a.reminder_sent)
        .bind(a.insurance_verified)
        .bind(a.copay_amount)
        .bind(a.estimated_cost)
        .bind(a.actual_start_time)
        .bind(a.actual_end_time)
        .bind(a.wait_time)
        .bind(a.follow_up_required)
        .bind(a.follow_up_date)
        .bind(&a.follow_up_instructions)
        .bind(a.cancelled_by)
        .bind(&a.cancellation_reason)
        .bind(a.cancellation_date)
        .bind(Json(&a.reschedule_history))
        .bind(a.created_by)
        .bind(a.last_updated_by)
        .bind(a.created_at)
        .bind(a.updated_at))
}

fn slot_error(err: DatabaseError, appointment: &Appointment) -> SchedulingError {
    if err.is_unique_violation() {
        if err.constraint() == Some(SLOT_CONSTRAINT) {
            SchedulingError::SlotConflict
        } else {
            SchedulingError::DuplicateIdentity(appointment.appointment_id.clone())
        }
    } else {
        err.into()
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &AppointmentListQuery) -> Result<()> {
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(doctor_id) = query.doctor_id {
        builder.push(" AND doctor_id = ").push_bind(doctor_id);
    }
    if let Some(patient_id) = query.patient_id {
        builder.push(" AND patient_id = ").push_bind(patient_id);
    }
    if let Some(date) = query.date {
        builder.push(" AND appointment_date = ").push_bind(date);
    }
    if let Some(department) = query.department {
        builder.push(" AND department = ").push_bind(encode_label(&department)?);
    }
    Ok(())
}

/// `appointments` table
#[derive(Clone)]
pub struct PgAppointmentStore {
    db: DatabasePool,
}

impl PgAppointmentStore {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn create(&self, mut appointment: Appointment) -> Result<Appointment> {
        let mut tx = self.db.begin().await?;

        let taken: bool = sqlx::query_scalar(
            r"SELECT EXISTS (
                SELECT 1 FROM appointments
                WHERE doctor_id = $1 AND appointment_date = $2 AND appointment_time = $3
                  AND status NOT IN ('cancelled', 'completed')
              )",
        )
        .bind(appointment.doctor_id)
        .bind(appointment.appointment_date)
        .bind(&appointment.appointment_time)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(SchedulingError::SlotConflict);
        }

        appointment.appointment_id =
            PgSequenceAllocator::next_identity_on(&mut *tx, APPOINTMENT_PREFIX).await?;

        // Concurrent inserts that both passed the check collide on the slot index
        let sql = format!(
            "INSERT INTO appointments ({}) VALUES ({})",
            column_list(),
            placeholders(1)
        );
        let result = bind_all(sqlx::query(&sql), &appointment)?
            .execute(&mut *tx)
            .await;
        if let Err(e) = result {
            return Err(slot_error(DatabaseError::from(e), &appointment));
        }

        tx.commit().await?;
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>> {
        let row: Option<AppointmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM appointments WHERE id = $1",
            column_list()
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;
        row.map(Appointment::try_from).transpose()
    }

    async fn list(&self, query: &AppointmentListQuery, page: PageRequest) -> Result<(Vec<Appointment>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM appointments WHERE TRUE");
        push_filters(&mut count, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(self.db.pool()).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM appointments WHERE TRUE",
            column_list()
        ));
        push_filters(&mut select, query)?;
        select
            .push(" ORDER BY appointment_date, appointment_time, created_at LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<AppointmentRow> = select.build_query_as().fetch_all(self.db.pool()).await?;
        let appointments = rows
            .into_iter()
            .map(Appointment::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((appointments, u64::try_from(total).unwrap_or_default()))
    }

    async fn doctor_schedule(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>> {
        let rows: Vec<AppointmentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM appointments \
             WHERE doctor_id = $1 AND appointment_date = $2 AND status <> $3 \
             ORDER BY appointment_time, created_at",
            column_list()
        ))
        .bind(doctor_id)
        .bind(date)
        .bind(AppointmentStatus::Cancelled.as_str())
        .fetch_all(self.db.pool())
        .await?;
        rows.into_iter().map(Appointment::try_from).collect()
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment> {
        let assignments = COLUMNS
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE appointments SET {assignments} WHERE id = $1");

        let result = bind_all(sqlx::query(&sql), appointment)?
            .execute(self.db.pool())
            .await
            .map_err(|e| slot_error(DatabaseError::from(e), appointment))?;

        if result.rows_affected() == 0 {
            return Err(SchedulingError::NotFound);
        }
        Ok(appointment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_cover_every_column() {
        let all = placeholders(1);
        assert!(all.starts_with("$1, $2"));
        assert!(all.ends_with(&format!("${}", COLUMNS.len())));
        assert_eq!(all.split(", ").count(), COLUMNS.len());
    }

    #[test]
    fn non_unique_failures_are_not_conflicts() {
        let appointment = crate::fixtures::booking(Uuid::new_v4(), "10:00");
        let err = slot_error(DatabaseError::QueryFailed("timeout".to_string()), &appointment);
        assert!(matches!(err, SchedulingError::Database(_)));
    }
}
