use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use database_layer::{
    decode_label, encode_label, DatabaseError, DatabasePool, PageRequest, PgSequenceAllocator,
    PATIENT_PREFIX,
};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{PatientError, Result};
use crate::models::*;
use crate::search::{PatientListQuery, SearchCriteria, SEARCH_LIMIT};
use crate::stats::{PatientStats, StatsOverview, AGE_BUCKETS};
use crate::store::{PatientDraft, PatientStore};

const PATIENT_COLUMNS: &str = "id, patient_id, first_name, last_name, date_of_birth, gender, \
     blood_type, marital_status, phone, email, address, emergency_contact, insurance, \
     preferences, status, registration_date, created_by, last_updated_by, created_at, updated_at";

#[derive(Debug, FromRow)]
struct PatientRow {
    id: Uuid,
    patient_id: String,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    gender: String,
    blood_type: Option<String>,
    marital_status: String,
    phone: String,
    email: Option<String>,
    address: Option<Json<Address>>,
    emergency_contact: Json<EmergencyContact>,
    insurance: Option<Json<Insurance>>,
    preferences: Json<Preferences>,
    status: String,
    registration_date: DateTime<Utc>,
    created_by: Option<Uuid>,
    last_updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PatientRow> for Patient {
    type Error = PatientError;

    fn try_from(row: PatientRow) -> Result<Self> {
        Ok(Patient {
            id: row.id,
            patient_id: row.patient_id,
            personal_info: PersonalInfo {
                first_name: row.first_name,
                last_name: row.last_name,
                date_of_birth: row.date_of_birth,
                gender: decode_label(&row.gender)?,
                blood_type: row.blood_type.as_deref().map(decode_label).transpose()?,
                marital_status: decode_label(&row.marital_status)?,
            },
            contact_info: ContactInfo {
                phone: row.phone,
                email: row.email,
                address: row.address.map(|a| a.0),
            },
            emergency_contact: row.emergency_contact.0,
            insurance: row.insurance.map(|i| i.0),
            preferences: row.preferences.0,
            status: decode_label(&row.status)?,
            registration_date: row.registration_date,
            created_by: row.created_by,
            last_updated_by: row.last_updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OverviewRow {
    total: i64,
    active: i64,
    inactive: i64,
    discharged: i64,
    unknown_age: i64,
}

/// One `GROUP BY` bucket
#[derive(Debug, FromRow)]
struct CountRow {
    label: String,
    count: i64,
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// Completed years on `$1`; rows born after `$1` are filtered out by the caller
const AGE_YEARS: &str = "date_part('year', age($1::timestamp, date_of_birth::timestamp))::int";

/// `CASE` expression mapping `years` onto the [`AGE_BUCKETS`] labels
fn age_bucket_case() -> String {
    let mut case = String::from("CASE");
    for (label, low, high) in AGE_BUCKETS {
        match high {
            Some(high) => case.push_str(&format!(" WHEN years BETWEEN {low} AND {high} THEN '{label}'")),
            None => case.push_str(&format!(" WHEN years >= {low} THEN '{label}'")),
        }
    }
    case.push_str(" END");
    case
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_list_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PatientListQuery) -> Result<()> {
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(encode_label(&status)?);
    }
    if let Some(term) = query.term() {
        let pattern = like_pattern(term);
        builder.push(" AND (");
        let mut separated = builder.separated(" OR ");
        for column in ["first_name", "last_name", "patient_id", "phone", "COALESCE(email, '')"] {
            separated.push(format!("{column} ILIKE "));
            separated.push_bind_unseparated(pattern.clone());
        }
        builder.push(")");
    }
    Ok(())
}

fn push_search_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    criteria: &SearchCriteria,
    today: NaiveDate,
) -> Result<()> {
    let fragments = [
        ("first_name", &criteria.first_name),
        ("last_name", &criteria.last_name),
        ("phone", &criteria.phone),
        ("COALESCE(email, '')", &criteria.email),
        ("COALESCE(address->>'city', '')", &criteria.city),
        ("patient_id", &criteria.patient_id),
    ];
    for (column, value) in fragments {
        if let Some(value) = value {
            builder
                .push(format!(" AND {column} ILIKE "))
                .push_bind(like_pattern(value));
        }
    }
    if let Some(blood_type) = criteria.blood_type {
        builder.push(" AND blood_type = ").push_bind(encode_label(&blood_type)?);
    }
    if let Some(gender) = criteria.gender {
        builder.push(" AND gender = ").push_bind(encode_label(&gender)?);
    }
    if let Some(age) = criteria.age {
        match SearchCriteria::birth_date_window(age, today) {
            Some((from, to)) => {
                builder
                    .push(" AND date_of_birth BETWEEN ")
                    .push_bind(from)
                    .push(" AND ")
                    .push_bind(to);
            }
            None => {
                builder.push(" AND FALSE");
            }
        }
    }
    Ok(())
}

/// `patients` table
#[derive(Clone)]
pub struct PgPatientStore {
    db: DatabasePool,
}

impl PgPatientStore {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn create(&self, draft: PatientDraft) -> Result<Patient> {
        let mut tx = self.db.begin().await?;
        let patient_id = PgSequenceAllocator::next_identity_on(&mut *tx, PATIENT_PREFIX).await?;
        let patient = draft.into_patient(patient_id);

        let result = sqlx::query(&format!(
            "INSERT INTO patients ({PATIENT_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"
        ))
        .bind(patient.id)
        .bind(&patient.patient_id)
        .bind(&patient.personal_info.first_name)
        .bind(&patient.personal_info.last_name)
        .bind(patient.personal_info.date_of_birth)
        .bind(encode_label(&patient.personal_info.gender)?)
        .bind(patient.personal_info.blood_type.map(|b| b.label()))
        .bind(encode_label(&patient.personal_info.marital_status)?)
        .bind(&patient.contact_info.phone)
        .bind(&patient.contact_info.email)
        .bind(patient.contact_info.address.as_ref().map(Json))
        .bind(Json(&patient.emergency_contact))
        .bind(patient.insurance.as_ref().map(Json))
        .bind(Json(&patient.preferences))
        .bind(encode_label(&patient.status)?)
        .bind(patient.registration_date)
        .bind(patient.created_by)
        .bind(patient.last_updated_by)
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(&mut *tx)
        .await;

        match result.map_err(DatabaseError::from) {
            Ok(_) => {}
            Err(e) if e.is_unique_violation() => {
                return Err(PatientError::DuplicateIdentity(patient.patient_id));
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;
        Ok(patient)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Patient>> {
        let row: Option<PatientRow> =
            sqlx::query_as(&format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
        row.map(Patient::try_from).transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Patient>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<PatientRow> =
            sqlx::query_as(&format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ANY($1)"))
                .bind(ids)
                .fetch_all(self.db.pool())
                .await?;
        rows.into_iter().map(Patient::try_from).collect()
    }

    async fn update(&self, patient: &Patient) -> Result<Patient> {
        let result = sqlx::query(
            r"UPDATE patients SET
                first_name = $2, last_name = $3, date_of_birth = $4, gender = $5,
                blood_type = $6, marital_status = $7, phone = $8, email = $9, address = $10,
                emergency_contact = $11, insurance = $12, preferences = $13, status = $14,
                last_updated_by = $15, updated_at = $16
              WHERE id = $1",
        )
        .bind(patient.id)
        .bind(&patient.personal_info.first_name)
        .bind(&patient.personal_info.last_name)
        .bind(patient.personal_info.date_of_birth)
        .bind(encode_label(&patient.personal_info.gender)?)
        .bind(patient.personal_info.blood_type.map(|b| b.label()))
        .bind(encode_label(&patient.personal_info.marital_status)?)
        .bind(&patient.contact_info.phone)
        .bind(&patient.contact_info.email)
        .bind(patient.contact_info.address.as_ref().map(Json))
        .bind(Json(&patient.emergency_contact))
        .bind(patient.insurance.as_ref().map(Json))
        .bind(Json(&patient.preferences))
        .bind(encode_label(&patient.status)?)
        .bind(patient.last_updated_by)
        .bind(patient.updated_at)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(PatientError::NotFound);
        }
        Ok(patient.clone())
    }

    async fn list(&self, query: &PatientListQuery, page: PageRequest) -> Result<(Vec<Patient>, u64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM patients WHERE TRUE");
        push_list_filters(&mut count, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(self.db.pool()).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE TRUE"
        ));
        push_list_filters(&mut select, query)?;
        select.push(format!(
            " ORDER BY {} {}, id",
            query.sort_field().column(),
            query.sort_order().sql()
        ));
        select
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<PatientRow> = select.build_query_as().fetch_all(self.db.pool()).await?;
        let patients = rows
            .into_iter()
            .map(Patient::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((patients, u64::try_from(total).unwrap_or_default()))
    }

    async fn search(&self, criteria: &SearchCriteria, today: NaiveDate) -> Result<Vec<Patient>> {
        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE TRUE"
        ));
        push_search_filters(&mut select, criteria, today)?;
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(SEARCH_LIMIT as i64);

        let rows: Vec<PatientRow> = select.build_query_as().fetch_all(self.db.pool()).await?;
        rows.into_iter().map(Patient::try_from).collect()
    }

    async fn stats(&self, today: NaiveDate) -> Result<PatientStats> {
        let pool = self.db.pool();
        let overview: OverviewRow = sqlx::query_as(
            r"SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = $2) AS active,
                COUNT(*) FILTER (WHERE status = $3) AS inactive,
                COUNT(*) FILTER (WHERE status = $4) AS discharged,
                COUNT(*) FILTER (WHERE date_of_birth > $1) AS unknown_age
              FROM patients",
        )
        .bind(today)
        .bind(encode_label(&PatientStatus::Active)?)
        .bind(encode_label(&PatientStatus::Inactive)?)
        .bind(encode_label(&PatientStatus::Discharged)?)
        .fetch_one(pool)
        .await?;

        let genders: Vec<CountRow> =
            sqlx::query_as("SELECT gender AS label, COUNT(*) AS count FROM patients GROUP BY gender")
                .fetch_all(pool)
                .await?;
        let blood_types: Vec<CountRow> = sqlx::query_as(
            "SELECT blood_type AS label, COUNT(*) AS count FROM patients \
             WHERE blood_type IS NOT NULL GROUP BY blood_type",
        )
        .fetch_all(pool)
        .await?;
        let ages: Vec<CountRow> = sqlx::query_as(&format!(
            "SELECT {} AS label, COUNT(*) AS count \
             FROM (SELECT {AGE_YEARS} AS years FROM patients WHERE date_of_birth <= $1) ages \
             GROUP BY 1",
            age_bucket_case()
        ))
        .bind(today)
        .fetch_all(pool)
        .await?;

        let mut stats = PatientStats::new();
        stats.overview = StatsOverview {
            total_patients: count(overview.total),
            active_patients: count(overview.active),
            inactive_patients: count(overview.inactive),
            discharged_patients: count(overview.discharged),
        };
        stats.unknown_age = count(overview.unknown_age);
        for row in genders {
            let gender: Gender = decode_label(&row.label)?;
            *stats.gender_stats.entry(gender.label().to_string()).or_default() += count(row.count);
        }
        for row in blood_types {
            let blood_type: BloodType = decode_label(&row.label)?;
            *stats
                .blood_type_stats
                .entry(blood_type.label().to_string())
                .or_default() += count(row.count);
        }
        for row in ages {
            stats.age_groups.insert(row.label, count(row.count));
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jo"), "%jo%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn age_case_covers_every_bucket() {
        let case = age_bucket_case();
        assert!(case.starts_with("CASE WHEN years BETWEEN 0 AND 17 THEN '0-17'"));
        assert!(case.contains("WHEN years BETWEEN 30 AND 49 THEN '30-49'"));
        assert!(case.ends_with("WHEN years >= 65 THEN '65+' END"));
    }
}
