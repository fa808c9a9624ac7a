//! CSV download of one side of the ledger

use crate::models::{EntryKind, LedgerEntry};

/// Rendered download ready to be sent as an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

impl CsvExport {
    pub const CONTENT_TYPE: &'static str = "text/csv; charset=utf-8";
}

fn escape_csv_value(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header `Category|Source,Amount,Date`, then one row per entry in the
/// order given
pub fn render_csv(kind: EntryKind, entries: &[LedgerEntry]) -> CsvExport {
    let mut csv = String::new();
    csv.push_str(kind.label_heading());
    csv.push_str(",Amount,Date\n");

    for entry in entries {
        let row = [
            escape_csv_value(&entry.label),
            entry.amount.normalize().to_string(),
            entry.date.format("%Y-%m-%d").to_string(),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    CsvExport {
        filename: format!("{}_details.csv", kind.as_str()),
        body: csv,
    }
}
