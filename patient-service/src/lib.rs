//! Patient registration for Carebook Engine
//!
//! Records receive a `PAT######` identity when created, are soft-deleted by
//! moving to `inactive`, and can be searched by contact fragments, blood
//! type, gender or approximate age. [`PatientStats`] summarises the registry.

pub mod error;
pub mod models;
pub mod postgres;
pub mod search;
pub mod service;
pub mod stats;
pub mod store;

pub use error::*;
pub use models::*;
pub use postgres::*;
pub use search::*;
pub use service::*;
pub use stats::*;
pub use store::*;

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::*;
    use crate::store::PatientDraft;
    use chrono::Utc;

    pub fn sample_input(first: &str, last: &str) -> PatientInput {
        serde_json::from_value(serde_json::json!({
            "personalInfo": {
                "firstName": first,
                "lastName": last,
                "dateOfBirth": "1985-04-12",
                "gender": "female",
                "bloodType": "AB+"
            },
            "contactInfo": { "phone": "+1 555-123-4567", "email": "pat@example.org" },
            "emergencyContact": { "name": "Sam", "relationship": "spouse", "phone": "555-987-6543" }
        }))
        .unwrap()
    }

    pub fn draft(first: &str, last: &str) -> PatientDraft {
        let input = sample_input(first, last);
        PatientDraft {
            personal_info: input.personal_info,
            contact_info: input.contact_info,
            emergency_contact: input.emergency_contact,
            insurance: input.insurance,
            preferences: input.preferences,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn patient(patient_id: &str, first: &str, last: &str) -> Patient {
        draft(first, last).into_patient(patient_id.to_string())
    }
}
