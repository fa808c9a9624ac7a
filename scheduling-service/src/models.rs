use auth_identity::UserSummary;
use chrono::{DateTime, NaiveDate, Utc};
use error_common::FieldErrors;
use patient_service::PatientSummary;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::status::{AppointmentStatus, StatusAction};
use crate::timing;

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    Consultation,
    FollowUp,
    Emergency,
    Surgery,
    Checkup,
    Vaccination,
    Therapy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    General,
    Cardiology,
    Neurology,
    Orthopedics,
    Pediatrics,
    Gynecology,
    Dermatology,
    Psychiatry,
    Oncology,
    Emergency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VisitType {
    #[default]
    InPerson,
    Telemedicine,
    PhoneConsultation,
}

/// Snapshot of a slot replaced by a reschedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleEntry {
    pub original_date: NaiveDate,
    pub original_time: String,
    pub new_date: NaiveDate,
    pub new_time: String,
    pub reason: Option<String>,
    pub rescheduled_by: Uuid,
    pub rescheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    /// `APT######`, assigned once at creation
    pub appointment_id: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    /// Zero-padded `HH:MM`
    pub appointment_time: String,
    /// Minutes
    pub duration: u32,
    pub appointment_type: AppointmentType,
    pub department: Department,
    pub status: AppointmentStatus,
    pub priority: Priority,
    pub reason: String,
    pub notes: Option<String>,
    pub symptoms: Vec<String>,
    pub visit_type: VisitType,
    pub room_number: Option<String>,
    pub reminder_sent: bool,
    pub insurance_verified: bool,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub copay_amount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub estimated_cost: Option<Decimal>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Minutes between the scheduled slot and the actual start, floored at 0
    pub wait_time: Option<i64>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_instructions: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub reschedule_history: Vec<RescheduleEntry>,
    pub created_by: Uuid,
    pub last_updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Scheduled instant of the slot, UTC
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        timing::scheduled_at(self.appointment_date, &self.appointment_time)
    }

    /// Whether this record blocks its doctor's slot for other bookings
    pub fn occupies_slot(&self) -> bool {
        self.status.occupies_slot()
    }

    pub fn same_slot(&self, other: &Appointment) -> bool {
        self.doctor_id == other.doctor_id
            && self.appointment_date == other.appointment_date
            && self.appointment_time == other.appointment_time
    }
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// `POST /api/appointments` body
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    /// Storage id of the patient record
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    #[validate(custom(function = "time_of_day"))]
    pub appointment_time: String,
    #[serde(default = "default_duration")]
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    pub duration: u32,
    pub appointment_type: AppointmentType,
    pub department: Department,
    #[serde(default)]
    pub priority: Priority,
    #[validate(custom(function = "required_text"))]
    pub reason: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub visit_type: VisitType,
    pub room_number: Option<String>,
    #[serde(default)]
    pub insurance_verified: bool,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub copay_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub estimated_cost: Option<Decimal>,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_instructions: Option<String>,
}

/// `PUT /api/appointments/:id` body. Status and slot are changed through the
/// dedicated status, cancel and reschedule routes; those keys are ignored here.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentChanges {
    #[validate(range(min = 5, max = 480, message = "Duration must be between 5 and 480 minutes"))]
    pub duration: Option<u32>,
    pub appointment_type: Option<AppointmentType>,
    pub department: Option<Department>,
    pub priority: Option<Priority>,
    #[validate(length(min = 1, message = "Reason for appointment is required"))]
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub symptoms: Option<Vec<String>>,
    pub visit_type: Option<VisitType>,
    pub room_number: Option<String>,
    pub reminder_sent: Option<bool>,
    pub insurance_verified: Option<bool>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub copay_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub estimated_cost: Option<Decimal>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_instructions: Option<String>,
}

impl NewAppointment {
    /// Derived validation plus the amount checks
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = field_errors(self.validate());
        check_amount(&mut errors, "copayAmount", self.copay_amount);
        check_amount(&mut errors, "estimatedCost", self.estimated_cost);
        errors.into_result()
    }
}

impl AppointmentChanges {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = field_errors(self.validate());
        if self.reason.as_deref().is_some_and(|r| r.trim().is_empty()) {
            errors.add("reason", "Reason for appointment is required");
        }
        check_amount(&mut errors, "copayAmount", self.copay_amount);
        check_amount(&mut errors, "estimatedCost", self.estimated_cost);
        errors.into_result()
    }

    pub fn apply_to(self, appointment: &mut Appointment) {
        if let Some(duration) = self.duration {
            appointment.duration = duration;
        }
        if let Some(kind) = self.appointment_type {
            appointment.appointment_type = kind;
        }
        if let Some(department) = self.department {
            appointment.department = department;
        }
        if let Some(priority) = self.priority {
            appointment.priority = priority;
        }
        if let Some(reason) = self.reason {
            appointment.reason = reason.trim().to_string();
        }
        if self.notes.is_some() {
            appointment.notes = self.notes;
        }
        if let Some(symptoms) = self.symptoms {
            appointment.symptoms = symptoms;
        }
        if let Some(visit_type) = self.visit_type {
            appointment.visit_type = visit_type;
        }
        if self.room_number.is_some() {
            appointment.room_number = self.room_number;
        }
        if let Some(sent) = self.reminder_sent {
            appointment.reminder_sent = sent;
        }
        if let Some(verified) = self.insurance_verified {
            appointment.insurance_verified = verified;
        }
        if self.copay_amount.is_some() {
            appointment.copay_amount = self.copay_amount;
        }
        if self.estimated_cost.is_some() {
            appointment.estimated_cost = self.estimated_cost;
        }
        if let Some(required) = self.follow_up_required {
            appointment.follow_up_required = required;
        }
        if self.follow_up_date.is_some() {
            appointment.follow_up_date = self.follow_up_date;
        }
        if self.follow_up_instructions.is_some() {
            appointment.follow_up_instructions = self.follow_up_instructions;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    #[validate(length(max = 500, message = "Reason is too long"))]
    pub reason: Option<String>,
}

/// `PATCH /api/appointments/:id/status` body
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub action: StatusAction,
    /// When the change happened; defaults to now
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub appointment_date: NaiveDate,
    #[validate(custom(function = "time_of_day"))]
    pub appointment_time: String,
    #[validate(length(max = 500, message = "Reason is too long"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AppointmentListQuery {
    pub status: Option<AppointmentStatus>,
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub department: Option<Department>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AppointmentListQuery {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.status.map_or(true, |s| appointment.status == s)
            && self.doctor_id.map_or(true, |d| appointment.doctor_id == d)
            && self.patient_id.map_or(true, |p| appointment.patient_id == p)
            && self.date.map_or(true, |d| appointment.appointment_date == d)
            && self.department.map_or(true, |d| appointment.department == d)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    pub date: Option<NaiveDate>,
}

/// Appointment with its patient and doctor stitched in
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<PatientSummary>,
    pub doctor: Option<UserSummary>,
    /// Minutes between actual start and end, when both are known
    pub actual_duration: Option<i64>,
    pub formatted_date_time: String,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn time_of_day(value: &str) -> Result<(), ValidationError> {
    match timing::normalize_time(value) {
        Some(_) => Ok(()),
        None => Err(invalid("time", "Please provide a valid time in HH:MM format")),
    }
}

fn required_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "Reason for appointment is required"));
    }
    Ok(())
}

fn field_errors(result: Result<(), validator::ValidationErrors>) -> FieldErrors {
    match result {
        Ok(()) => FieldErrors::new(),
        Err(e) => FieldErrors::from(e),
    }
}

fn check_amount(errors: &mut FieldErrors, field: &str, amount: Option<Decimal>) {
    if amount.is_some_and(|a| a < Decimal::ZERO) {
        errors.add(field, "Amount cannot be negative");
    }
}
