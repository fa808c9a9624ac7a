use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodType {
    pub fn label(self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
    Discharged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[validate(length(min = 1, max = 50, message = "First name is required (max 50 characters)"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required (max 50 characters)"))]
    pub last_name: String,
    #[validate(custom(function = "birth_date_not_in_future"))]
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub blood_type: Option<BloodType>,
    #[serde(default)]
    pub marital_status: MaritalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[validate(length(max = 20, message = "Zip code is too long"))]
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[validate(custom(function = "phone_number"))]
    pub phone: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[validate(nested)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[validate(length(min = 1, message = "Emergency contact name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Emergency contact relationship is required"))]
    pub relationship: String,
    #[validate(custom(function = "phone_number"))]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Insurance {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub group_number: Option<String>,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub preferred_language: String,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub special_needs: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            preferred_language: "English".to_string(),
            allergies: Vec::new(),
            medications: Vec::new(),
            special_needs: None,
        }
    }
}

/// Stored patient record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    /// `PAT######`, assigned once at creation
    pub patient_id: String,
    pub personal_info: PersonalInfo,
    pub contact_info: ContactInfo,
    pub emergency_contact: EmergencyContact,
    pub insurance: Option<Insurance>,
    pub preferences: Preferences,
    pub status: PatientStatus,
    pub registration_date: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub last_updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.personal_info.first_name, self.personal_info.last_name
        )
    }

    /// Completed years on `today`
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        age_on(self.personal_info.date_of_birth, today)
    }
}

/// Completed years between `date_of_birth` and `today`; `None` for future dates
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Create/update payload
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    #[validate(nested)]
    pub personal_info: PersonalInfo,
    #[validate(nested)]
    pub contact_info: ContactInfo,
    #[validate(nested)]
    pub emergency_contact: EmergencyContact,
    #[validate(nested)]
    pub insurance: Option<Insurance>,
    #[serde(default)]
    pub preferences: Preferences,
    /// Ignored on creation; records always start `active`
    pub status: Option<PatientStatus>,
}

/// Response shape with derived fields
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub full_name: String,
    pub age: Option<u32>,
}

impl PatientView {
    pub fn new(patient: Patient, today: NaiveDate) -> Self {
        Self {
            full_name: patient.full_name(),
            age: patient.age_on(today),
            patient,
        }
    }
}

/// Compact patient reference embedded in appointment views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: Uuid,
    pub patient_id: String,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        Self {
            id: patient.id,
            patient_id: patient.patient_id.clone(),
            full_name: patient.full_name(),
            phone: patient.contact_info.phone.clone(),
            email: patient.contact_info.email.clone(),
        }
    }
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn birth_date_not_in_future(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date > Utc::now().date_naive() {
        return Err(invalid("future_date", "Date of birth cannot be in the future"));
    }
    Ok(())
}

/// Digits with optional `+`, spaces, dashes, dots and parentheses; 7 to 15 digits
fn phone_number(phone: &str) -> Result<(), ValidationError> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Err(invalid("required", "Phone number is required"));
    }
    let allowed = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'));
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if !allowed || !(7..=15).contains(&digits) {
        return Err(invalid("phone", "Phone number is not valid"));
    }
    Ok(())
}
