use serde::Serialize;
use std::collections::BTreeMap;
use validator::{ValidationErrors, ValidationErrorsKind};

/// Field-level validation failures keyed by the camelCase path of the field
/// (`personalInfo.firstName`, `symptoms[2]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-field shortcut
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// First message of the first failing field, used as the summary line
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().flatten().next().map(String::as_str)
    }

    /// Ok when nothing was recorded, otherwise the collected errors
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    fn collect(&mut self, prefix: Option<&str>, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let name = to_camel_case(&field.to_string());
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{name}"),
                None => name,
            };
            match kind {
                ValidationErrorsKind::Field(failures) => {
                    for failure in failures {
                        let message = failure
                            .message
                            .as_ref()
                            .map_or_else(|| format!("Invalid value ({})", failure.code), ToString::to_string);
                        self.add(path.clone(), message);
                    }
                }
                ValidationErrorsKind::Struct(nested) => self.collect(Some(&path), nested),
                ValidationErrorsKind::List(items) => {
                    for (index, nested) in items {
                        self.collect(Some(&format!("{path}[{index}]")), nested);
                    }
                }
            }
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        fields.collect(None, &errors);
        fields
    }
}

/// Rust field names are snake_case; API payloads are camelCase.
fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}
