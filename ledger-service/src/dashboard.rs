//! Dashboard aggregation over one user's ledger

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{EntryRecord, LedgerEntry};

pub const RECENT_TRANSACTIONS: usize = 5;
pub const EXPENSE_WINDOW_DAYS: u64 = 30;
pub const INCOME_WINDOW_DAYS: u64 = 60;

/// One point of the expense series
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
}

/// Entries of a trailing window with their sum
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
    #[schema(value_type = Vec<EntryRecord>)]
    pub transactions: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_expense: Decimal,
    /// Income minus expense
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total_balance: Decimal,
    /// Latest entries of both kinds, by date
    #[schema(value_type = Vec<EntryRecord>)]
    pub recent_transactions: Vec<LedgerEntry>,
    pub last_30_days_expenses: Vec<SeriesPoint>,
    #[schema(value_type = Vec<EntryRecord>)]
    pub recent_income: Vec<LedgerEntry>,
    pub last_60_days_income: WindowSummary,
}

fn total(entries: &[LedgerEntry]) -> Decimal {
    entries.iter().map(|e| e.amount).sum()
}

fn since(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// Latest first; entries on the same date keep the newer insert first
fn latest(entries: impl IntoIterator<Item = LedgerEntry>, limit: usize) -> Vec<LedgerEntry> {
    let mut entries: Vec<LedgerEntry> = entries.into_iter().collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    entries.truncate(limit);
    entries
}

impl Dashboard {
    /// Aggregate `expenses` and `income` as seen on `today`. Window series
    /// keep the order the entries were given in.
    pub fn compute(expenses: &[LedgerEntry], income: &[LedgerEntry], today: NaiveDate) -> Self {
        let total_income = total(income);
        let total_expense = total(expenses);

        let expense_cutoff = since(today, EXPENSE_WINDOW_DAYS);
        let last_30_days_expenses = expenses
            .iter()
            .filter(|e| e.date >= expense_cutoff)
            .map(|e| SeriesPoint {
                date: e.date,
                amount: e.amount,
            })
            .collect();

        let income_cutoff = since(today, INCOME_WINDOW_DAYS);
        let window: Vec<LedgerEntry> = income
            .iter()
            .filter(|e| e.date >= income_cutoff)
            .cloned()
            .collect();

        Self {
            total_income,
            total_expense,
            total_balance: total_income - total_expense,
            recent_transactions: latest(
                expenses.iter().chain(income.iter()).cloned(),
                RECENT_TRANSACTIONS,
            ),
            last_30_days_expenses,
            recent_income: latest(income.iter().cloned(), RECENT_TRANSACTIONS),
            last_60_days_income: WindowSummary {
                total: total(&window),
                transactions: window,
            },
        }
    }
}
