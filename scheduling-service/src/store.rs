use async_trait::async_trait;
use chrono::NaiveDate;
use database_layer::{PageRequest, SequenceAllocator, APPOINTMENT_PREFIX};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, SchedulingError};
use crate::models::{Appointment, AppointmentListQuery};
use crate::status::AppointmentStatus;

/// Order used by listings: date, then time
pub fn sort_by_slot(appointments: &mut [Appointment]) {
    appointments.sort_by(|a, b| {
        (a.appointment_date, &a.appointment_time, a.created_at)
            .cmp(&(b.appointment_date, &b.appointment_time, b.created_at))
    });
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Insert with the next `APT######` identity (replacing whatever
    /// `appointment_id` holds), rejecting a slot that another live appointment
    /// of the same doctor holds. Both happen in one atomic unit.
    async fn create(&self, appointment: Appointment) -> Result<Appointment>;
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>>;
    /// One page ordered by slot, plus the total match count
    async fn list(&self, query: &AppointmentListQuery, page: PageRequest) -> Result<(Vec<Appointment>, u64)>;
    /// A doctor's non-cancelled appointments on `date`, ordered by time
    async fn doctor_schedule(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>>;
    /// Overwrite an existing record. The slot check is repeated so that a
    /// reschedule cannot land on an occupied slot.
    async fn update(&self, appointment: &Appointment) -> Result<Appointment>;
}

/// In-memory implementation for development/testing
#[derive(Clone)]
pub struct InMemoryAppointmentStore {
    appointments: Arc<RwLock<HashMap<Uuid, Appointment>>>,
    sequences: Arc<dyn SequenceAllocator>,
}

impl InMemoryAppointmentStore {
    pub fn new(sequences: Arc<dyn SequenceAllocator>) -> Self {
        Self {
            appointments: Arc::new(RwLock::new(HashMap::new())),
            sequences,
        }
    }
}

fn slot_taken(appointments: &HashMap<Uuid, Appointment>, candidate: &Appointment) -> bool {
    candidate.occupies_slot()
        && appointments.values().any(|other| {
            other.id != candidate.id && other.occupies_slot() && other.same_slot(candidate)
        })
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create(&self, mut appointment: Appointment) -> Result<Appointment> {
        // The write lock spans the conflict check and the insert
        let mut appointments = self.appointments.write().await;
        // A rejected booking must not consume an identity
        if slot_taken(&appointments, &appointment) {
            return Err(SchedulingError::SlotConflict);
        }
        appointment.appointment_id = self.sequences.next_identity(APPOINTMENT_PREFIX).await?;

        if appointments
            .values()
            .any(|a| a.appointment_id == appointment.appointment_id)
        {
            return Err(SchedulingError::DuplicateIdentity(appointment.appointment_id));
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &AppointmentListQuery, page: PageRequest) -> Result<(Vec<Appointment>, u64)> {
        let mut matching: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        sort_by_slot(&mut matching);
        let total = matching.len() as u64;
        Ok((page.apply(matching), total))
    }

    async fn doctor_schedule(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>> {
        let mut day: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|a| {
                a.doctor_id == doctor_id
                    && a.appointment_date == date
                    && a.status != AppointmentStatus::Cancelled
            })
            .cloned()
            .collect();
        sort_by_slot(&mut day);
        Ok(day)
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment> {
        let mut appointments = self.appointments.write().await;
        if !appointments.contains_key(&appointment.id) {
            return Err(SchedulingError::NotFound);
        }
        if slot_taken(&appointments, appointment) {
            return Err(SchedulingError::SlotConflict);
        }
        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::booking;
    use database_layer::InMemorySequenceAllocator;

    fn store() -> InMemoryAppointmentStore {
        InMemoryAppointmentStore::new(Arc::new(InMemorySequenceAllocator::new()))
    }

    #[tokio::test]
    async fn occupied_slot_is_a_conflict() {
        let store = store();
        let doctor = Uuid::new_v4();
        let first = store.create(booking(doctor, "09:00")).await.unwrap();
        assert_eq!(first.appointment_id, "APT000001");

        let second = store.create(booking(doctor, "09:00")).await;
        assert!(matches!(second, Err(SchedulingError::SlotConflict)));

        // Other doctors and other times are free
        store.create(booking(Uuid::new_v4(), "09:00")).await.unwrap();
        store.create(booking(doctor, "09:30")).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_booking_does_not_consume_an_identity() {
        let store = store();
        let doctor = Uuid::new_v4();
        store.create(booking(doctor, "10:00")).await.unwrap();
        assert!(store.create(booking(doctor, "10:00")).await.is_err());

        let next = store.create(booking(doctor, "10:30")).await.unwrap();
        assert_eq!(next.appointment_id, "APT000002");
    }

    #[tokio::test]
    async fn cancelled_appointment_frees_the_slot() {
        let store = store();
        let doctor = Uuid::new_v4();
        let mut first = store.create(booking(doctor, "11:00")).await.unwrap();
        first.status = AppointmentStatus::Cancelled;
        store.update(&first).await.unwrap();

        store.create(booking(doctor, "11:00")).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_bookings_of_one_slot_admit_exactly_one() {
        let store = store();
        let doctor = Uuid::new_v4();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.create(booking(doctor, "14:00")).await }));
        }
        let mut booked = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                booked += 1;
            }
        }
        assert_eq!(booked, 1);
    }

    #[tokio::test]
    async fn moving_onto_an_occupied_slot_is_rejected() {
        let store = store();
        let doctor = Uuid::new_v4();
        store.create(booking(doctor, "08:00")).await.unwrap();
        let mut other = store.create(booking(doctor, "08:30")).await.unwrap();

        other.appointment_time = "08:00".to_string();
        assert!(matches!(store.update(&other).await, Err(SchedulingError::SlotConflict)));
    }

    #[tokio::test]
    async fn schedule_skips_cancelled_and_orders_by_time() {
        let store = store();
        let doctor = Uuid::new_v4();
        store.create(booking(doctor, "15:00")).await.unwrap();
        let mut cancelled = store.create(booking(doctor, "10:00")).await.unwrap();
        cancelled.status = AppointmentStatus::Cancelled;
        store.update(&cancelled).await.unwrap();
        store.create(booking(doctor, "09:00")).await.unwrap();

        let date = cancelled.appointment_date;
        let times: Vec<String> = store
            .doctor_schedule(doctor, date)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.appointment_time)
            .collect();
        assert_eq!(times, vec!["09:00".to_string(), "15:00".to_string()]);
    }
}
