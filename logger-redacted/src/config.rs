// Logger configuration
use serde::{Deserialize, Serialize};

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for workspace crates when `RUST_LOG` is unset
    pub level: String,
    pub format: LogFormat,
    /// Enable ANSI colors for the pretty format
    pub ansi: bool,
    /// Extra filter directives, e.g. `sqlx=warn`
    pub directives: Vec<String>,
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        let mut parts: Vec<String> = [
            "carebook_server",
            "patient_service",
            "scheduling_service",
            "leave_service",
            "ledger_service",
            "auth_identity",
            "database_layer",
        ]
        .iter()
        .map(|target| format!("{target}={}", self.level))
        .collect();
        parts.push("tower_http=info".to_string());
        parts.push("sqlx=warn".to_string());
        parts.extend(self.directives.iter().cloned());
        parts.join(",")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_includes_workspace_targets_and_extras() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            directives: vec!["hyper=warn".to_string()],
            ..Default::default()
        };
        let filter = config.default_filter();
        assert!(filter.contains("patient_service=debug"));
        assert!(filter.ends_with("hyper=warn"));
    }

    #[test]
    fn format_deserializes_lowercase() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }
}
