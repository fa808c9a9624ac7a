use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use database_layer::{PageRequest, SequenceAllocator, PATIENT_PREFIX};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{PatientError, Result};
use crate::models::*;
use crate::search::{PatientListQuery, SearchCriteria, SEARCH_LIMIT};
use crate::stats::PatientStats;

/// A validated patient awaiting its `PAT######` identity
#[derive(Debug, Clone)]
pub struct PatientDraft {
    pub personal_info: PersonalInfo,
    pub contact_info: ContactInfo,
    pub emergency_contact: EmergencyContact,
    pub insurance: Option<Insurance>,
    pub preferences: Preferences,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PatientDraft {
    pub fn into_patient(self, patient_id: String) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            patient_id,
            personal_info: self.personal_info,
            contact_info: self.contact_info,
            emergency_contact: self.emergency_contact,
            insurance: self.insurance,
            preferences: self.preferences,
            status: PatientStatus::Active,
            registration_date: self.created_at,
            created_by: self.created_by,
            last_updated_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Persist a draft, assigning the next identity in the same atomic unit
    async fn create(&self, draft: PatientDraft) -> Result<Patient>;
    async fn get(&self, id: Uuid) -> Result<Option<Patient>>;
    /// Batch lookup for view stitching; unknown ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Patient>>;
    /// Overwrite an existing record; [`PatientError::NotFound`] if absent
    async fn update(&self, patient: &Patient) -> Result<Patient>;
    /// One page of matching records plus the total match count
    async fn list(&self, query: &PatientListQuery, page: PageRequest) -> Result<(Vec<Patient>, u64)>;
    /// Newest first, at most [`SEARCH_LIMIT`] records
    async fn search(&self, criteria: &SearchCriteria, today: NaiveDate) -> Result<Vec<Patient>>;
    async fn stats(&self, today: NaiveDate) -> Result<PatientStats>;
}

/// In-memory implementation for development/testing
#[derive(Clone)]
pub struct InMemoryPatientStore {
    patients: Arc<RwLock<HashMap<Uuid, Patient>>>,
    sequences: Arc<dyn SequenceAllocator>,
}

impl InMemoryPatientStore {
    pub fn new(sequences: Arc<dyn SequenceAllocator>) -> Self {
        Self {
            patients: Arc::new(RwLock::new(HashMap::new())),
            sequences,
        }
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn create(&self, draft: PatientDraft) -> Result<Patient> {
        let patient_id = self.sequences.next_identity(PATIENT_PREFIX).await?;

        let mut patients = self.patients.write().await;
        if patients.values().any(|p| p.patient_id == patient_id) {
            return Err(PatientError::DuplicateIdentity(patient_id));
        }
        let patient = draft.into_patient(patient_id);
        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Patient>> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Patient>> {
        let patients = self.patients.read().await;
        Ok(ids.iter().filter_map(|id| patients.get(id).cloned()).collect())
    }

    async fn update(&self, patient: &Patient) -> Result<Patient> {
        let mut patients = self.patients.write().await;
        match patients.get_mut(&patient.id) {
            Some(existing) => {
                *existing = patient.clone();
                Ok(patient.clone())
            }
            None => Err(PatientError::NotFound),
        }
    }

    async fn list(&self, query: &PatientListQuery, page: PageRequest) -> Result<(Vec<Patient>, u64)> {
        let mut matching: Vec<Patient> = self
            .patients
            .read()
            .await
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        query.sort(&mut matching);
        let total = matching.len() as u64;
        Ok((page.apply(matching), total))
    }

    async fn search(&self, criteria: &SearchCriteria, today: NaiveDate) -> Result<Vec<Patient>> {
        let mut matching: Vec<Patient> = self
            .patients
            .read()
            .await
            .values()
            .filter(|p| criteria.matches(p, today))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(SEARCH_LIMIT);
        Ok(matching)
    }

    async fn stats(&self, today: NaiveDate) -> Result<PatientStats> {
        let patients = self.patients.read().await;
        Ok(PatientStats::compute(patients.values(), today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::draft;
    use database_layer::{is_valid_identity, DatabaseResult, InMemorySequenceAllocator};
    use mockall::mock;
    use std::collections::HashSet;

    mock! {
        pub Sequences {}

        #[async_trait]
        impl SequenceAllocator for Sequences {
            async fn next_value(&self, name: &str) -> DatabaseResult<i64>;
        }
    }

    fn store() -> InMemoryPatientStore {
        InMemoryPatientStore::new(Arc::new(InMemorySequenceAllocator::new()))
    }

    #[tokio::test]
    async fn identities_are_well_formed_and_unique() {
        let store = store();
        let mut seen = HashSet::new();
        for i in 0..20 {
            let patient = store.create(draft(&format!("P{i}"), "Test")).await.unwrap();
            assert!(is_valid_identity(PATIENT_PREFIX, &patient.patient_id));
            assert_eq!(patient.patient_id.len(), 9);
            assert!(seen.insert(patient.patient_id));
        }
    }

    #[tokio::test]
    async fn concurrent_creations_get_distinct_identities() {
        let store = store();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(draft(&format!("C{i}"), "Test")).await.unwrap().patient_id
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            assert!(seen.insert(handle.await.unwrap()));
        }
    }

    #[tokio::test]
    async fn repeated_sequence_value_is_a_duplicate_identity() {
        let mut sequences = MockSequences::new();
        sequences.expect_next_value().times(2).returning(|_| Ok(7));
        let store = InMemoryPatientStore::new(Arc::new(sequences));

        let first = store.create(draft("Ann", "First")).await.unwrap();
        assert_eq!(first.patient_id, "PAT000007");

        let second = store.create(draft("Ben", "Second")).await;
        assert!(matches!(second, Err(PatientError::DuplicateIdentity(id)) if id == "PAT000007"));
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() {
        let store = store();
        let ghost = draft("No", "Body").into_patient("PAT999999".to_string());
        assert!(matches!(store.update(&ghost).await, Err(PatientError::NotFound)));
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let store = store();
        for i in 0..12 {
            store.create(draft(&format!("N{i:02}"), "Paged")).await.unwrap();
        }
        let (page, total) = store
            .list(&PatientListQuery::default(), PageRequest::new(Some(2), Some(5)))
            .await
            .unwrap();
        assert_eq!(total, 12);
        assert_eq!(page.len(), 5);
        assert!(page
            .windows(2)
            .all(|w| matches!(w, [a, b] if a.created_at >= b.created_at)));
    }
}
