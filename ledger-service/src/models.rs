use chrono::{DateTime, NaiveDate, Utc};
use error_common::FieldErrors;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Which side of the ledger an entry sits on. Expenses are labelled with a
/// category, income with a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Expense => "expense",
            EntryKind::Income => "income",
        }
    }

    /// Capitalised name for messages and file names
    pub fn title(self) -> &'static str {
        match self {
            EntryKind::Expense => "Expense",
            EntryKind::Income => "Income",
        }
    }

    /// JSON key carrying the label
    pub fn label_key(self) -> &'static str {
        match self {
            EntryKind::Expense => "category",
            EntryKind::Income => "source",
        }
    }

    /// Column heading for the label in exports
    pub fn label_heading(self) -> &'static str {
        match self {
            EntryKind::Expense => "Category",
            EntryKind::Income => "Source",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "EntryRecord")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: EntryKind,
    /// Category for expenses, source for income
    pub label: String,
    pub icon: Option<String>,
    /// Always positive, two decimal places
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Wire shape of a [`LedgerEntry`]: the label goes out under `category` or
/// `source` depending on the kind.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(as = LedgerEntry)]
pub struct EntryRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub icon: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for EntryRecord {
    fn from(entry: LedgerEntry) -> Self {
        let (category, source) = match entry.kind {
            EntryKind::Expense => (Some(entry.label), None),
            EntryKind::Income => (None, Some(entry.label)),
        };
        Self {
            id: entry.id,
            user_id: entry.user_id,
            kind: entry.kind,
            category,
            source,
            icon: entry.icon,
            amount: entry.amount,
            date: entry.date,
            created_at: entry.created_at,
        }
    }
}

/// Body of the add routes. Fields are loose on purpose so that a missing or
/// mistyped value becomes a field error instead of a parse failure.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    #[validate(length(max = 200, message = "Icon is too long"))]
    pub icon: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    /// Number or numeric string
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Value>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp
    pub date: Option<String>,
}

/// A [`NewEntry`] that passed the boundary checks
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    pub label: String,
    pub icon: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl NewEntry {
    /// Coerce and check the fields for an entry of `kind`
    pub fn check(self, kind: EntryKind) -> Result<ValidEntry, FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };

        let raw_label = match kind {
            EntryKind::Expense => self.category,
            EntryKind::Income => self.source,
        };
        let label = raw_label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
        if label.is_none() {
            errors.add(kind.label_key(), format!("{} is required", kind.label_heading()));
        }

        let amount = match self.amount.as_ref().map(parse_amount) {
            None => {
                errors.add("amount", "Amount is required");
                None
            }
            Some(None) => {
                errors.add("amount", "Amount must be a positive number");
                None
            }
            Some(Some(amount)) => Some(amount),
        };

        let date = match self.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            None => {
                errors.add("date", "Date is required");
                None
            }
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    errors.add("date", "Date must be YYYY-MM-DD or an ISO 8601 timestamp");
                }
                parsed
            }
        };

        match (label, amount, date) {
            (Some(label), Some(amount), Some(date)) if errors.is_empty() => Ok(ValidEntry {
                label,
                icon: self.icon.filter(|i| !i.trim().is_empty()),
                amount,
                date,
            }),
            _ => Err(errors),
        }
    }
}

/// Positive amount rounded to cents, from a JSON number or numeric string
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    let amount = match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))?,
        Value::String(s) => Decimal::from_str(s.trim()).ok()?,
        _ => return None,
    };
    let amount = amount.round_dp(2);
    (amount > Decimal::ZERO).then_some(amount)
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(body: Value) -> NewEntry {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let valid = entry(json!({ "category": "Food", "amount": "12.50", "date": "2024-05-01" }))
            .check(EntryKind::Expense)
            .unwrap();
        assert_eq!(valid.amount, Decimal::new(1250, 2));
        assert_eq!(valid.label, "Food");
    }

    #[test]
    fn timestamps_keep_their_date() {
        let valid = entry(json!({ "source": "Salary", "amount": 2000, "date": "2024-05-01T10:00:00Z" }))
            .check(EntryKind::Income)
            .unwrap();
        assert_eq!(valid.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn bad_amounts_are_rejected() {
        for amount in [json!(0), json!(-5), json!("abc"), json!(true), json!("0.001")] {
            let errors = entry(json!({ "category": "Food", "amount": amount, "date": "2024-05-01" }))
                .check(EntryKind::Expense)
                .unwrap_err();
            assert!(errors.get("amount").is_some(), "{amount}");
        }
    }

    #[test]
    fn income_needs_a_source_not_a_category() {
        let errors = entry(json!({ "category": "Salary", "amount": 10, "date": "2024-05-01" }))
            .check(EntryKind::Income)
            .unwrap_err();
        assert!(errors.get("source").is_some());
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = NewEntry::default().check(EntryKind::Expense).unwrap_err();
        assert!(errors.get("category").is_some());
        assert!(errors.get("amount").is_some());
        assert!(errors.get("date").is_some());
    }

    #[test]
    fn label_is_serialized_under_its_kind_key() {
        let expense = LedgerEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: EntryKind::Expense,
            label: "Rent".to_string(),
            icon: None,
            amount: Decimal::new(120_000, 2),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["category"], "Rent");
        assert_eq!(value["type"], "expense");
        assert_eq!(value["amount"], 1200.0);
        assert!(value.get("source").is_none());
    }
}
