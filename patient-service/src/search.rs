//! Listing and search filters over patient records

use chrono::{Datelike, NaiveDate};
use error_common::FieldErrors;
use serde::Deserialize;
use std::cmp::Ordering;
use utoipa::{IntoParams, ToSchema};

use crate::models::{BloodType, Gender, Patient, PatientStatus};

/// Maximum number of records returned by a search
pub const SEARCH_LIMIT: usize = 50;

/// Columns a listing may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    RegistrationDate,
    PatientId,
    FirstName,
    LastName,
    DateOfBirth,
}

impl SortField {
    /// Unknown names fall back to `createdAt`
    pub fn parse(name: &str) -> Self {
        match name {
            "updatedAt" => SortField::UpdatedAt,
            "registrationDate" => SortField::RegistrationDate,
            "patientId" => SortField::PatientId,
            "firstName" | "personalInfo.firstName" => SortField::FirstName,
            "lastName" | "personalInfo.lastName" => SortField::LastName,
            "dateOfBirth" | "personalInfo.dateOfBirth" => SortField::DateOfBirth,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::RegistrationDate => "registration_date",
            SortField::PatientId => "patient_id",
            SortField::FirstName => "first_name",
            SortField::LastName => "last_name",
            SortField::DateOfBirth => "date_of_birth",
        }
    }

    fn compare(self, a: &Patient, b: &Patient) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::RegistrationDate => a.registration_date.cmp(&b.registration_date),
            SortField::PatientId => a.patient_id.cmp(&b.patient_id),
            SortField::FirstName => a.personal_info.first_name.cmp(&b.personal_info.first_name),
            SortField::LastName => a.personal_info.last_name.cmp(&b.personal_info.last_name),
            SortField::DateOfBirth => a
                .personal_info
                .date_of_birth
                .cmp(&b.personal_info.date_of_birth),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query string of `GET /api/patients`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PatientListQuery {
    /// Substring of first/last name, patient ID, phone or email
    pub search: Option<String>,
    pub status: Option<PatientStatus>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PatientListQuery {
    pub fn sort_field(&self) -> SortField {
        self.sort_by.as_deref().map(SortField::parse).unwrap_or_default()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }

    /// Trimmed, non-empty free-text term
    pub fn term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn matches(&self, patient: &Patient) -> bool {
        if let Some(status) = self.status {
            if patient.status != status {
                return false;
            }
        }
        match self.term() {
            Some(term) => {
                let needle = term.to_lowercase();
                [
                    Some(patient.personal_info.first_name.as_str()),
                    Some(patient.personal_info.last_name.as_str()),
                    Some(patient.patient_id.as_str()),
                    Some(patient.contact_info.phone.as_str()),
                    patient.contact_info.email.as_deref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }

    /// Order matching records in place
    pub fn sort(&self, patients: &mut [Patient]) {
        let field = self.sort_field();
        let order = self.sort_order();
        patients.sort_by(|a, b| {
            let ordering = field.compare(a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
}

/// Raw query string of `GET /api/patients/search`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PatientSearchQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// One of `A+`, `A-`, `B+`, `B-`, `AB+`, `AB-`, `O+`, `O-`
    pub blood_type: Option<String>,
    pub gender: Option<String>,
    /// Approximate age in years
    pub age: Option<String>,
    pub city: Option<String>,
    pub patient_id: Option<String>,
}

/// Parsed search filters, all AND-combined
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCriteria {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub blood_type: Option<BloodType>,
    pub gender: Option<Gender>,
    pub age: Option<u32>,
    pub city: Option<String>,
    pub patient_id: Option<String>,
}

fn fragment(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(needle.as_str()),
        None => true,
    }
}

impl TryFrom<PatientSearchQuery> for SearchCriteria {
    type Error = FieldErrors;

    fn try_from(query: PatientSearchQuery) -> std::result::Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        // `+` arrives as a space when the client forgets to percent-encode it
        let blood_type = match fragment(query.blood_type) {
            Some(raw) => {
                let label = raw.to_uppercase().replace(' ', "+");
                match serde_json::from_value::<BloodType>(serde_json::Value::String(label)) {
                    Ok(blood_type) => Some(blood_type),
                    Err(_) => {
                        errors.add("bloodType", "Blood type is not valid");
                        None
                    }
                }
            }
            None => None,
        };

        let gender = match fragment(query.gender) {
            Some(raw) => match serde_json::from_value::<Gender>(serde_json::Value::String(raw)) {
                Ok(gender) => Some(gender),
                Err(_) => {
                    errors.add("gender", "Gender must be male, female or other");
                    None
                }
            },
            None => None,
        };

        let age = match fragment(query.age) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(age) if age <= 150 => Some(age),
                _ => {
                    errors.add("age", "Age must be a whole number of years");
                    None
                }
            },
            None => None,
        };

        errors.into_result()?;

        Ok(SearchCriteria {
            first_name: fragment(query.first_name),
            last_name: fragment(query.last_name),
            phone: fragment(query.phone),
            email: fragment(query.email),
            blood_type,
            gender,
            age,
            city: fragment(query.city),
            patient_id: fragment(query.patient_id),
        })
    }
}

impl SearchCriteria {
    /// Inclusive birth-date range for an approximate age: birth year within
    /// one year either side of `today.year() - age`.
    pub fn birth_date_window(age: u32, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let target = today.year() - i32::try_from(age).ok()?;
        let from = NaiveDate::from_ymd_opt(target - 1, 1, 1)?;
        let to = NaiveDate::from_ymd_opt(target + 1, 12, 31)?;
        Some((from, to))
    }

    pub fn matches(&self, patient: &Patient, today: NaiveDate) -> bool {
        let personal = &patient.personal_info;
        let contact = &patient.contact_info;

        if !contains(&personal.first_name, &self.first_name)
            || !contains(&personal.last_name, &self.last_name)
            || !contains(&contact.phone, &self.phone)
            || !contains(&patient.patient_id, &self.patient_id)
        {
            return false;
        }
        if self.email.is_some() && !contains(contact.email.as_deref().unwrap_or_default(), &self.email) {
            return false;
        }
        if self.city.is_some() {
            let city = contact
                .address
                .as_ref()
                .and_then(|a| a.city.as_deref())
                .unwrap_or_default();
            if !contains(city, &self.city) {
                return false;
            }
        }
        if let Some(blood_type) = self.blood_type {
            if personal.blood_type != Some(blood_type) {
                return false;
            }
        }
        if let Some(gender) = self.gender {
            if personal.gender != gender {
                return false;
            }
        }
        if let Some(age) = self.age {
            match Self::birth_date_window(age, today) {
                Some((from, to)) => {
                    if personal.date_of_birth < from || personal.date_of_birth > to {
                        return false;
                    }
                }
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::patient;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    #[test]
    fn first_name_fragment_is_case_insensitive() {
        let criteria = SearchCriteria::try_from(PatientSearchQuery {
            first_name: Some("Jo".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert!(criteria.matches(&patient("PAT000001", "John", "Smith"), today()));
        assert!(criteria.matches(&patient("PAT000002", "Joanna", "Lee"), today()));
        assert!(!criteria.matches(&patient("PAT000003", "Mark", "Jones"), today()));
    }

    #[test]
    fn blood_type_accepts_unencoded_plus() {
        let criteria = SearchCriteria::try_from(PatientSearchQuery {
            blood_type: Some("ab ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(criteria.blood_type, Some(BloodType::AbPositive));
    }

    #[test]
    fn invalid_filters_are_field_errors() {
        let errors = SearchCriteria::try_from(PatientSearchQuery {
            gender: Some("robot".to_string()),
            age: Some("old".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(errors.get("gender").is_some());
        assert!(errors.get("age").is_some());
    }

    #[test]
    fn age_window_spans_three_birth_years() {
        let (from, to) = SearchCriteria::birth_date_window(40, today()).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(1983, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(1985, 12, 31).unwrap());
    }

    #[test]
    fn list_query_searches_contact_fields_and_filters_status() {
        let mut record = patient("PAT000009", "Ada", "King");
        record.contact_info.email = Some("ada@clinic.org".to_string());

        let query = PatientListQuery {
            search: Some("CLINIC".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&record));

        let query = PatientListQuery {
            status: Some(PatientStatus::Discharged),
            ..Default::default()
        };
        assert!(!query.matches(&record));
    }

    #[test]
    fn unknown_sort_field_defaults_to_created_at() {
        assert_eq!(SortField::parse("password"), SortField::CreatedAt);
        assert_eq!(SortField::parse("lastName").column(), "last_name");
    }
}
