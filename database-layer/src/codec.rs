//! Text-column codec for enums that serialize as plain strings.
//!
//! Stored labels are exactly the serde names used on the wire, so a value
//! such as `"follow-up"` or `"AB+"` reads the same in SQL and in JSON.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{DatabaseError, DatabaseResult};

/// Serde label of a unit-variant enum
///
/// # Errors
///
/// Returns [`DatabaseError::QueryFailed`] if `value` does not serialize to a string.
pub fn encode_label<T: Serialize>(value: &T) -> DatabaseResult<String> {
    match serde_json::to_value(value) {
        Ok(Value::String(label)) => Ok(label),
        Ok(other) => Err(DatabaseError::QueryFailed(format!(
            "expected a string label, got {other}"
        ))),
        Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
    }
}

/// Parse a stored label back into its enum
///
/// # Errors
///
/// Returns [`DatabaseError::QueryFailed`] for labels no variant carries.
pub fn decode_label<T: DeserializeOwned>(label: &str) -> DatabaseResult<T> {
    serde_json::from_value(Value::String(label.to_string()))
        .map_err(|e| DatabaseError::QueryFailed(format!("unrecognised stored value '{label}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    enum Kind {
        FollowUp,
        #[serde(rename = "AB+")]
        AbPositive,
    }

    #[test]
    fn labels_match_wire_names() {
        assert_eq!(encode_label(&Kind::FollowUp).unwrap(), "follow-up");
        assert_eq!(encode_label(&Kind::AbPositive).unwrap(), "AB+");
        assert_eq!(decode_label::<Kind>("follow-up").unwrap(), Kind::FollowUp);
    }

    #[test]
    fn unknown_labels_fail() {
        assert!(decode_label::<Kind>("surgery").is_err());
    }
}
