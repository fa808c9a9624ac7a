use auth_identity::{UserRepository, UserSummary};
use chrono::{NaiveDate, Utc};
use database_layer::{PageInfo, PageRequest};
use error_common::FieldErrors;
use patient_service::{PatientStore, PatientSummary};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{error::*, models::*, status::*, store::*, timing};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPage {
    pub appointments: Vec<AppointmentView>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoctorSchedule {
    pub appointments: Vec<AppointmentView>,
    pub date: NaiveDate,
}

#[derive(Clone)]
pub struct SchedulingService {
    store: Arc<dyn AppointmentStore>,
    patients: Arc<dyn PatientStore>,
    users: Arc<dyn UserRepository>,
}

impl SchedulingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        patients: Arc<dyn PatientStore>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            store,
            patients,
            users,
        }
    }

    /// Book a slot after checking the patient and attending doctor exist
    pub async fn create(&self, request: NewAppointment, actor: Uuid) -> Result<AppointmentView> {
        request.check()?;
        let appointment_time = timing::normalize_time(&request.appointment_time).ok_or_else(|| {
            FieldErrors::single("appointmentTime", "Please provide a valid time in HH:MM format")
        })?;

        if self.patients.get(request.patient_id).await?.is_none() {
            return Err(SchedulingError::PatientNotFound);
        }
        match self.users.find_by_id(request.doctor_id).await? {
            Some(doctor) if doctor.role.can_attend_appointments() => {}
            _ => return Err(SchedulingError::DoctorNotFound),
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            appointment_id: String::new(),
            patient_id: request.patient_id,
            doctor_id: request.doctor_id,
            appointment_date: request.appointment_date,
            appointment_time,
            duration: request.duration,
            appointment_type: request.appointment_type,
            department: request.department,
            status: AppointmentStatus::Scheduled,
            priority: request.priority,
            reason: request.reason.trim().to_string(),
            notes: request.notes,
            symptoms: request.symptoms,
            visit_type: request.visit_type,
            room_number: request.room_number,
            reminder_sent: false,
            insurance_verified: request.insurance_verified,
            copay_amount: request.copay_amount,
            estimated_cost: request.estimated_cost,
            actual_start_time: None,
            actual_end_time: None,
            wait_time: None,
            follow_up_required: request.follow_up_required,
            follow_up_date: request.follow_up_date,
            follow_up_instructions: request.follow_up_instructions,
            cancelled_by: None,
            cancellation_reason: None,
            cancellation_date: None,
            reschedule_history: Vec::new(),
            created_by: actor,
            last_updated_by: None,
            created_at: now,
            updated_at: now,
        };

        let appointment = match self.store.create(appointment).await {
            Err(SchedulingError::SlotConflict) => {
                warn!(
                    doctor_id = %request.doctor_id,
                    date = %request.appointment_date,
                    "Rejected booking of an occupied slot"
                );
                return Err(SchedulingError::SlotConflict);
            }
            other => other?,
        };
        info!(appointment_id = %appointment.appointment_id, "Appointment booked");
        self.view(appointment).await
    }

    pub async fn list(&self, query: &AppointmentListQuery) -> Result<AppointmentPage> {
        let page = PageRequest::new(query.page, query.limit);
        let (appointments, total) = self.store.list(query, page).await?;
        Ok(AppointmentPage {
            appointments: self.views(appointments).await?,
            pagination: page.info(total),
        })
    }

    pub async fn doctor_schedule(&self, doctor_id: Uuid, date: Option<NaiveDate>) -> Result<DoctorSchedule> {
        let date = date.ok_or_else(|| FieldErrors::single("date", "Date is required"))?;
        let appointments = self.store.doctor_schedule(doctor_id, date).await?;
        Ok(DoctorSchedule {
            appointments: self.views(appointments).await?,
            date,
        })
    }

    pub async fn get(&self, id: Uuid) -> Result<AppointmentView> {
        let appointment = self.load(id).await?;
        self.view(appointment).await
    }

    /// Detail update; status and slot stay as they are
    pub async fn update(&self, id: Uuid, changes: AppointmentChanges, actor: Uuid) -> Result<AppointmentView> {
        changes.check()?;
        let mut appointment = self.load(id).await?;
        changes.apply_to(&mut appointment);
        appointment.last_updated_by = Some(actor);
        appointment.updated_at = Utc::now();

        let appointment = self.store.update(&appointment).await?;
        info!(appointment_id = %appointment.appointment_id, "Appointment updated");
        self.view(appointment).await
    }

    pub async fn cancel(&self, id: Uuid, request: CancelRequest, actor: Uuid) -> Result<AppointmentView> {
        request.validate()?;
        let mut appointment = self.load(id).await?;
        appointment.status = transition(appointment.status, StatusAction::Cancel)?;

        let now = Utc::now();
        appointment.cancelled_by = Some(actor);
        appointment.cancellation_reason = request
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        appointment.cancellation_date = Some(now);
        appointment.last_updated_by = Some(actor);
        appointment.updated_at = now;

        let appointment = self.store.update(&appointment).await?;
        info!(appointment_id = %appointment.appointment_id, "Appointment cancelled");
        self.view(appointment).await
    }

    /// Confirm, start, complete or mark a no-show
    pub async fn change_status(&self, id: Uuid, change: StatusChange, actor: Uuid) -> Result<AppointmentView> {
        if matches!(change.action, StatusAction::Cancel | StatusAction::Reschedule) {
            return Err(FieldErrors::single(
                "action",
                format!("Use the {} endpoint for this action", change.action),
            )
            .into());
        }

        let mut appointment = self.load(id).await?;
        let from = appointment.status;
        appointment.status = transition(from, change.action)?;

        let at = change.at.unwrap_or_else(Utc::now);
        match change.action {
            StatusAction::Start => {
                appointment.actual_start_time = Some(at);
                appointment.wait_time = appointment
                    .scheduled_at()
                    .map(|scheduled| timing::wait_time_minutes(scheduled, at));
            }
            StatusAction::Complete => appointment.actual_end_time = Some(at),
            _ => {}
        }
        appointment.last_updated_by = Some(actor);
        appointment.updated_at = Utc::now();

        let appointment = self.store.update(&appointment).await?;
        info!(
            appointment_id = %appointment.appointment_id,
            from = %from,
            to = %appointment.status,
            "Appointment status changed"
        );
        self.view(appointment).await
    }

    /// Move to a new slot, recording the old one in the history
    pub async fn reschedule(&self, id: Uuid, request: RescheduleRequest, actor: Uuid) -> Result<AppointmentView> {
        request.validate()?;
        let new_time = timing::normalize_time(&request.appointment_time).ok_or_else(|| {
            FieldErrors::single("appointmentTime", "Please provide a valid time in HH:MM format")
        })?;

        let mut appointment = self.load(id).await?;
        appointment.status = transition(appointment.status, StatusAction::Reschedule)?;

        let now = Utc::now();
        appointment.reschedule_history.push(RescheduleEntry {
            original_date: appointment.appointment_date,
            original_time: appointment.appointment_time.clone(),
            new_date: request.appointment_date,
            new_time: new_time.clone(),
            reason: request.reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            rescheduled_by: actor,
            rescheduled_at: now,
        });
        appointment.appointment_date = request.appointment_date;
        appointment.appointment_time = new_time;
        appointment.last_updated_by = Some(actor);
        appointment.updated_at = now;

        let appointment = self.store.update(&appointment).await?;
        info!(
            appointment_id = %appointment.appointment_id,
            date = %appointment.appointment_date,
            time = %appointment.appointment_time,
            "Appointment rescheduled"
        );
        self.view(appointment).await
    }

    async fn load(&self, id: Uuid) -> Result<Appointment> {
        self.store.get(id).await?.ok_or(SchedulingError::NotFound)
    }

    async fn view(&self, appointment: Appointment) -> Result<AppointmentView> {
        let mut views = self.views(vec![appointment]).await?;
        views.pop().ok_or(SchedulingError::NotFound)
    }

    /// Fetch the referenced patients and doctors in two batch lookups
    async fn views(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentView>> {
        let patient_ids: Vec<Uuid> = appointments
            .iter()
            .map(|a| a.patient_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let doctor_ids: Vec<Uuid> = appointments
            .iter()
            .map(|a| a.doctor_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let patients: HashMap<Uuid, PatientSummary> = self
            .patients
            .find_many(&patient_ids)
            .await?
            .iter()
            .map(|p| (p.id, PatientSummary::from(p)))
            .collect();
        let doctors: HashMap<Uuid, UserSummary> = self
            .users
            .find_many(&doctor_ids)
            .await?
            .iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();

        Ok(appointments
            .into_iter()
            .map(|appointment| AppointmentView {
                patient: patients.get(&appointment.patient_id).cloned(),
                doctor: doctors.get(&appointment.doctor_id).cloned(),
                actual_duration: timing::actual_duration_minutes(
                    appointment.actual_start_time,
                    appointment.actual_end_time,
                ),
                formatted_date_time: timing::formatted_date_time(
                    appointment.appointment_date,
                    &appointment.appointment_time,
                ),
                appointment,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Harness;
    use chrono::Duration;

    #[tokio::test]
    async fn booking_stitches_patient_and_doctor() {
        let h = Harness::new().await;
        let view = h.service.create(h.request("09:00"), h.doctor).await.unwrap();

        assert_eq!(view.appointment.appointment_id, "APT000001");
        assert_eq!(view.appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(view.patient.as_ref().map(|p| p.id), Some(h.patient));
        assert_eq!(view.doctor.as_ref().map(|d| d.id), Some(h.doctor));
        assert_eq!(view.formatted_date_time, "Mon Jun 03 2024 at 09:00");
    }

    #[tokio::test]
    async fn double_booking_is_a_conflict() {
        let h = Harness::new().await;
        h.service.create(h.request("10:00"), h.doctor).await.unwrap();

        let mut again = h.request("10:00");
        again.reason = "Another visit".to_string();
        let result = h.service.create(again, h.doctor).await;
        assert!(matches!(result, Err(SchedulingError::SlotConflict)));
    }

    #[tokio::test]
    async fn unpadded_time_collides_with_padded_time() {
        let h = Harness::new().await;
        h.service.create(h.request("09:05"), h.doctor).await.unwrap();
        let result = h.service.create(h.request("9:05"), h.doctor).await;
        assert!(matches!(result, Err(SchedulingError::SlotConflict)));
    }

    #[tokio::test]
    async fn unknown_patient_and_non_doctor_are_not_found() {
        let h = Harness::new().await;

        let mut request = h.request("11:00");
        request.patient_id = Uuid::new_v4();
        let result = h.service.create(request, h.doctor).await;
        assert!(matches!(result, Err(SchedulingError::PatientNotFound)));

        let mut request = h.request("11:00");
        request.doctor_id = h.nurse;
        let result = h.service.create(request, h.doctor).await;
        assert!(matches!(result, Err(SchedulingError::DoctorNotFound)));
    }

    #[tokio::test]
    async fn start_records_wait_time_and_complete_records_duration() {
        let h = Harness::new().await;
        let booked = h.service.create(h.request("09:30"), h.doctor).await.unwrap();
        let scheduled = booked.appointment.scheduled_at().unwrap();

        let started = h
            .service
            .change_status(
                booked.appointment.id,
                StatusChange {
                    action: StatusAction::Start,
                    at: Some(scheduled + Duration::minutes(12)),
                },
                h.doctor,
            )
            .await
            .unwrap();
        assert_eq!(started.appointment.status, AppointmentStatus::InProgress);
        assert_eq!(started.appointment.wait_time, Some(12));

        let done = h
            .service
            .change_status(
                booked.appointment.id,
                StatusChange {
                    action: StatusAction::Complete,
                    at: Some(scheduled + Duration::minutes(42)),
                },
                h.doctor,
            )
            .await
            .unwrap();
        assert_eq!(done.appointment.status, AppointmentStatus::Completed);
        assert_eq!(done.actual_duration, Some(30));
    }

    #[tokio::test]
    async fn cancelled_appointment_cannot_be_started_and_frees_its_slot() {
        let h = Harness::new().await;
        let booked = h.service.create(h.request("13:00"), h.doctor).await.unwrap();

        let cancelled = h
            .service
            .cancel(
                booked.appointment.id,
                CancelRequest {
                    reason: Some("Patient travelling".to_string()),
                },
                h.doctor,
            )
            .await
            .unwrap();
        assert_eq!(cancelled.appointment.status, AppointmentStatus::Cancelled);
        assert_eq!(cancelled.appointment.cancelled_by, Some(h.doctor));
        assert!(cancelled.appointment.cancellation_date.is_some());

        let result = h
            .service
            .change_status(
                booked.appointment.id,
                StatusChange {
                    action: StatusAction::Start,
                    at: None,
                },
                h.doctor,
            )
            .await;
        assert!(matches!(result, Err(SchedulingError::InvalidTransition(_))));

        h.service.create(h.request("13:00"), h.doctor).await.unwrap();
    }

    #[tokio::test]
    async fn reschedule_appends_history_and_checks_the_new_slot() {
        let h = Harness::new().await;
        h.service.create(h.request("08:00"), h.doctor).await.unwrap();
        let booked = h.service.create(h.request("08:30"), h.doctor).await.unwrap();

        let blocked = h
            .service
            .reschedule(booked.appointment.id, h.move_to("08:00"), h.doctor)
            .await;
        assert!(matches!(blocked, Err(SchedulingError::SlotConflict)));

        let moved = h
            .service
            .reschedule(booked.appointment.id, h.move_to("16:15"), h.doctor)
            .await
            .unwrap();
        assert_eq!(moved.appointment.status, AppointmentStatus::Rescheduled);
        assert_eq!(moved.appointment.appointment_time, "16:15");
        let history = &moved.appointment.reschedule_history;
        assert_eq!(history.len(), 1);
        assert_eq!(history.first().map(|e| e.original_time.as_str()), Some("08:30"));
    }

    #[tokio::test]
    async fn status_route_refuses_cancel_and_reschedule() {
        let h = Harness::new().await;
        let booked = h.service.create(h.request("12:00"), h.doctor).await.unwrap();
        let result = h
            .service
            .change_status(
                booked.appointment.id,
                StatusChange {
                    action: StatusAction::Cancel,
                    at: None,
                },
                h.doctor,
            )
            .await;
        assert!(matches!(result, Err(SchedulingError::Validation(_))));
    }

    #[tokio::test]
    async fn schedule_requires_a_date() {
        let h = Harness::new().await;
        let result = h.service.doctor_schedule(h.doctor, None).await;
        assert!(matches!(result, Err(SchedulingError::Validation(e)) if e.get("date").is_some()));
    }

    #[tokio::test]
    async fn list_filters_by_doctor() {
        let h = Harness::new().await;
        h.service.create(h.request("09:00"), h.doctor).await.unwrap();
        h.service.create(h.request("10:00"), h.doctor).await.unwrap();

        let page = h
            .service
            .list(&AppointmentListQuery {
                doctor_id: Some(h.doctor),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.pagination.total_records, 2);
        assert_eq!(
            page.appointments
                .iter()
                .map(|v| v.appointment.appointment_time.as_str())
                .collect::<Vec<_>>(),
            vec!["09:00", "10:00"]
        );

        let none = h
            .service
            .list(&AppointmentListQuery {
                doctor_id: Some(h.nurse),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.appointments.is_empty());
    }
}
