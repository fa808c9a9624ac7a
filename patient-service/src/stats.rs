use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::models::{age_on, BloodType, Gender, Patient, PatientStatus};

/// Age histogram buckets, lower bound inclusive
pub const AGE_BUCKETS: [(&str, u32, Option<u32>); 5] = [
    ("0-17", 0, Some(17)),
    ("18-29", 18, Some(29)),
    ("30-49", 30, Some(49)),
    ("50-64", 50, Some(64)),
    ("65+", 65, None),
];

/// Bucket label for an age in completed years
pub fn age_bucket(age: u32) -> &'static str {
    AGE_BUCKETS
        .iter()
        .find(|(_, low, high)| age >= *low && high.map_or(true, |high| age <= high))
        .map_or("65+", |(label, _, _)| label)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsOverview {
    pub total_patients: u64,
    pub active_patients: u64,
    pub inactive_patients: u64,
    pub discharged_patients: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientStats {
    pub overview: StatsOverview,
    pub gender_stats: BTreeMap<String, u64>,
    pub blood_type_stats: BTreeMap<String, u64>,
    pub age_groups: BTreeMap<String, u64>,
    pub unknown_age: u64,
}

impl PatientStats {
    /// Empty statistics with every age bucket present at zero
    pub fn new() -> Self {
        let mut stats = PatientStats::default();
        for (label, _, _) in AGE_BUCKETS {
            stats.age_groups.insert(label.to_string(), 0);
        }
        stats
    }

    pub fn compute<'a>(patients: impl IntoIterator<Item = &'a Patient>, today: NaiveDate) -> Self {
        let mut stats = PatientStats::new();
        for patient in patients {
            stats.record(
                patient.status,
                patient.personal_info.gender,
                patient.personal_info.blood_type,
                patient.personal_info.date_of_birth,
                today,
            );
        }
        stats
    }

    /// Count one record
    pub fn record(
        &mut self,
        status: PatientStatus,
        gender: Gender,
        blood_type: Option<BloodType>,
        date_of_birth: NaiveDate,
        today: NaiveDate,
    ) {
        self.overview.total_patients += 1;
        match status {
            PatientStatus::Active => self.overview.active_patients += 1,
            PatientStatus::Inactive => self.overview.inactive_patients += 1,
            PatientStatus::Discharged => self.overview.discharged_patients += 1,
        }

        *self.gender_stats.entry(gender.label().to_string()).or_default() += 1;

        if let Some(blood_type) = blood_type {
            *self
                .blood_type_stats
                .entry(blood_type.label().to_string())
                .or_default() += 1;
        }

        match age_on(date_of_birth, today) {
            Some(age) => *self.age_groups.entry(age_bucket(age).to_string()).or_default() += 1,
            None => self.unknown_age += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::patient;
    use chrono::Datelike;

    #[test]
    fn bucket_boundaries() {
        assert_eq!(age_bucket(0), "0-17");
        assert_eq!(age_bucket(17), "0-17");
        assert_eq!(age_bucket(18), "18-29");
        assert_eq!(age_bucket(49), "30-49");
        assert_eq!(age_bucket(64), "50-64");
        assert_eq!(age_bucket(65), "65+");
        assert_eq!(age_bucket(103), "65+");
    }

    #[test]
    fn forty_year_old_lands_in_thirty_to_forty_nine() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let mut record = patient("PAT000001", "Forty", "Years");
        record.personal_info.date_of_birth =
            NaiveDate::from_ymd_opt(today.year() - 40, 5, 20).unwrap();

        let stats = PatientStats::compute([&record], today);
        assert_eq!(stats.age_groups.get("30-49"), Some(&1));
        assert_eq!(stats.age_groups.get("50-64"), Some(&0));
        assert_eq!(stats.unknown_age, 0);
    }

    #[test]
    fn counts_statuses_and_distributions() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let active = patient("PAT000001", "A", "One");
        let mut inactive = patient("PAT000002", "B", "Two");
        inactive.status = PatientStatus::Inactive;
        inactive.personal_info.gender = Gender::Male;
        inactive.personal_info.blood_type = Some(BloodType::ONegative);
        let mut unborn = patient("PAT000003", "C", "Three");
        unborn.personal_info.date_of_birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let stats = PatientStats::compute([&active, &inactive, &unborn], today);
        assert_eq!(stats.overview.total_patients, 3);
        assert_eq!(stats.overview.active_patients, 2);
        assert_eq!(stats.overview.inactive_patients, 1);
        assert_eq!(stats.gender_stats.get("male"), Some(&1));
        assert_eq!(stats.blood_type_stats.get("O-"), Some(&1));
        assert_eq!(stats.unknown_age, 1);
    }
}
