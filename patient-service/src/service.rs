use chrono::{NaiveDate, Utc};
use database_layer::{PageInfo, PageRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{error::*, models::*, search::*, stats::*, store::*};

/// One page of `GET /api/patients`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientPage {
    pub patients: Vec<PatientView>,
    pub pagination: PageInfo,
}

/// Result of `GET /api/patients/search`
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSearchResult {
    pub patients: Vec<PatientView>,
    pub count: usize,
}

#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn PatientStore>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl PatientService {
    pub fn new(store: Arc<dyn PatientStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn PatientStore> {
        Arc::clone(&self.store)
    }

    pub async fn create(&self, input: PatientInput, actor: Option<Uuid>) -> Result<PatientView> {
        input.validate()?;

        let draft = PatientDraft {
            personal_info: input.personal_info,
            contact_info: input.contact_info,
            emergency_contact: input.emergency_contact,
            insurance: input.insurance,
            preferences: input.preferences,
            created_by: actor,
            created_at: Utc::now(),
        };
        let patient = self.store.create(draft).await?;
        info!(patient_id = %patient.patient_id, "Patient registered");
        Ok(PatientView::new(patient, today()))
    }

    pub async fn get(&self, id: Uuid) -> Result<PatientView> {
        let patient = self.store.get(id).await?.ok_or(PatientError::NotFound)?;
        Ok(PatientView::new(patient, today()))
    }

    pub async fn list(&self, query: &PatientListQuery) -> Result<PatientPage> {
        let page = PageRequest::new(query.page, query.limit);
        let (patients, total) = self.store.list(query, page).await?;
        let today = today();
        Ok(PatientPage {
            patients: patients
                .into_iter()
                .map(|p| PatientView::new(p, today))
                .collect(),
            pagination: page.info(total),
        })
    }

    /// Full replacement of the editable sections; `patientId` never changes
    pub async fn update(&self, id: Uuid, input: PatientInput, actor: Option<Uuid>) -> Result<PatientView> {
        input.validate()?;

        let mut patient = self.store.get(id).await?.ok_or(PatientError::NotFound)?;
        patient.personal_info = input.personal_info;
        patient.contact_info = input.contact_info;
        patient.emergency_contact = input.emergency_contact;
        patient.insurance = input.insurance;
        patient.preferences = input.preferences;
        if let Some(status) = input.status {
            patient.status = status;
        }
        patient.last_updated_by = actor;
        patient.updated_at = Utc::now();

        let patient = self.store.update(&patient).await?;
        info!(patient_id = %patient.patient_id, "Patient updated");
        Ok(PatientView::new(patient, today()))
    }

    /// Soft delete: the record stays retrievable with status `inactive`
    pub async fn deactivate(&self, id: Uuid, actor: Option<Uuid>) -> Result<PatientView> {
        let mut patient = self.store.get(id).await?.ok_or(PatientError::NotFound)?;
        patient.status = PatientStatus::Inactive;
        patient.last_updated_by = actor;
        patient.updated_at = Utc::now();

        let patient = self.store.update(&patient).await?;
        info!(patient_id = %patient.patient_id, "Patient deactivated");
        Ok(PatientView::new(patient, today()))
    }

    pub async fn search(&self, query: PatientSearchQuery) -> Result<PatientSearchResult> {
        debug!(
            filters = %logger_redacted::redact(&format!("{query:?}")),
            "Patient search"
        );
        let criteria = SearchCriteria::try_from(query).map_err(PatientError::Validation)?;
        let today = today();
        let patients: Vec<PatientView> = self
            .store
            .search(&criteria, today)
            .await?
            .into_iter()
            .map(|p| PatientView::new(p, today))
            .collect();
        Ok(PatientSearchResult {
            count: patients.len(),
            patients,
        })
    }

    pub async fn stats(&self) -> Result<PatientStats> {
        self.store.stats(today()).await
    }

    /// Batch lookup used by appointment views
    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Patient>> {
        self.store.find_many(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_input;
    use database_layer::InMemorySequenceAllocator;

    fn service() -> PatientService {
        PatientService::new(Arc::new(InMemoryPatientStore::new(Arc::new(
            InMemorySequenceAllocator::new(),
        ))))
    }

    #[tokio::test]
    async fn created_patient_gets_identity_and_derived_fields() {
        let view = service().create(sample_input("John", "Doe"), None).await.unwrap();
        assert_eq!(view.patient.patient_id, "PAT000001");
        assert_eq!(view.full_name, "John Doe");
        assert_eq!(view.patient.status, PatientStatus::Active);
        assert!(view.age.is_some());
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_persistence() {
        let service = service();
        let result = service.create(sample_input("", "Doe"), None).await;
        assert!(matches!(result, Err(PatientError::Validation(_))));

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.overview.total_patients, 0);
    }

    #[tokio::test]
    async fn update_keeps_patient_id() {
        let service = service();
        let created = service.create(sample_input("John", "Doe"), None).await.unwrap();
        let actor = Uuid::new_v4();

        let updated = service
            .update(created.patient.id, sample_input("Johnny", "Doe"), Some(actor))
            .await
            .unwrap();
        assert_eq!(updated.patient.patient_id, created.patient.patient_id);
        assert_eq!(updated.full_name, "Johnny Doe");
        assert_eq!(updated.patient.last_updated_by, Some(actor));
    }

    #[tokio::test]
    async fn delete_is_soft() {
        let service = service();
        let created = service.create(sample_input("John", "Doe"), None).await.unwrap();

        service.deactivate(created.patient.id, None).await.unwrap();
        let fetched = service.get(created.patient.id).await.unwrap();
        assert_eq!(fetched.patient.status, PatientStatus::Inactive);
    }

    #[tokio::test]
    async fn unknown_patient_is_not_found() {
        let result = service().deactivate(Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(PatientError::NotFound)));
    }

    #[tokio::test]
    async fn search_by_first_name_fragment() {
        let service = service();
        for (first, last) in [("John", "Smith"), ("Joanna", "Lee"), ("Mark", "Jones")] {
            service.create(sample_input(first, last), None).await.unwrap();
        }

        let result = service
            .search(PatientSearchQuery {
                first_name: Some("Jo".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut names: Vec<_> = result
            .patients
            .iter()
            .map(|p| p.patient.personal_info.first_name.clone())
            .collect();
        names.sort();
        assert_eq!(result.count, 2);
        assert_eq!(names, vec!["Joanna".to_string(), "John".to_string()]);
    }

    #[tokio::test]
    async fn list_paginates_with_defaults() {
        let service = service();
        for i in 0..12 {
            service.create(sample_input(&format!("P{i}"), "List"), None).await.unwrap();
        }
        let page = service.list(&PatientListQuery::default()).await.unwrap();
        assert_eq!(page.patients.len(), 10);
        assert_eq!(page.pagination.total_records, 12);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(page.pagination.has_next);
    }
}
