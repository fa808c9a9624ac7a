use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

use crate::LoggerError;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PHONE_PATTERN: &str = r"(?:\+\d{1,3}[-.\s]?)?\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b";
const SSN_PATTERN: &str = r"\b\d{3}-\d{2}-\d{4}\b";
const IP_PATTERN: &str = r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b";

lazy_static! {
    static ref DEFAULT_REDACTOR: Result<PiiRedactor, LoggerError> =
        PiiRedactor::new(RedactionConfig::default());
}

/// Redact `text` with the default rules.
///
/// Falls back to a fixed placeholder if the default patterns failed to compile,
/// so unredacted input never reaches a log line.
pub fn redact(text: &str) -> String {
    match &*DEFAULT_REDACTOR {
        Ok(redactor) => redactor.redact(text),
        Err(_) => "[REDACTED]".to_string(),
    }
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_ip_addresses: bool,
    pub hash_for_correlation: bool,
    /// Extra `(pattern, replacement)` pairs applied after the built-in rules
    pub custom_patterns: Vec<(String, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_ip_addresses: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// PII redactor for log messages
#[derive(Debug)]
pub struct PiiRedactor {
    config: RedactionConfig,
    email: Regex,
    phone: Regex,
    ssn: Regex,
    ip: Regex,
    custom: Vec<(Regex, String)>,
}

impl PiiRedactor {
    /// Compile the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidPattern`] if a custom pattern is not a valid regex.
    pub fn new(config: RedactionConfig) -> Result<Self, LoggerError> {
        let custom = config
            .custom_patterns
            .iter()
            .map(|(pattern, replacement)| Ok((compile(pattern)?, replacement.clone())))
            .collect::<Result<Vec<_>, LoggerError>>()?;

        Ok(Self {
            email: compile(EMAIL_PATTERN)?,
            phone: compile(PHONE_PATTERN)?,
            ssn: compile(SSN_PATTERN)?,
            ip: compile(IP_PATTERN)?,
            custom,
            config,
        })
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&self.email, &result, "EMAIL", |email| {
                let (local, domain) = email.split_once('@').unwrap_or((email, ""));
                format!("{}***@{}***", first_char(local), first_char(domain))
            });
        }

        // SSNs before phones: the phone pattern would otherwise swallow them
        if self.config.redact_ssn {
            result = self.replace(&self.ssn, &result, "SSN", |_| "***-**-****".to_string());
        }

        if self.config.redact_phones {
            result = self.replace(&self.phone, &result, "PHONE", |_| "(***) ***-****".to_string());
        }

        if self.config.redact_ip_addresses {
            result = self.replace(&self.ip, &result, "IP", |ip| {
                let octets: Vec<&str> = ip.split('.').collect();
                match (octets.first(), octets.last()) {
                    (Some(first), Some(last)) if octets.len() == 4 => format!("{first}.***.***.{last}"),
                    _ => "***.***.***.***".to_string(),
                }
            });
        }

        for (pattern, replacement) in &self.custom {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    fn replace(
        &self,
        pattern: &Regex,
        text: &str,
        label: &str,
        mask: impl Fn(&str) -> String,
    ) -> String {
        pattern
            .replace_all(text, |caps: &Captures| {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("{label}[{}]", hash_value(matched))
                } else {
                    mask(matched)
                }
            })
            .to_string()
    }
}

fn compile(pattern: &str) -> Result<Regex, LoggerError> {
    Regex::new(pattern).map_err(|e| LoggerError::InvalidPattern(format!("{pattern}: {e}")))
}

fn first_char(value: &str) -> &str {
    value.char_indices().nth(1).map_or(value, |(idx, _)| value.get(..idx).unwrap_or(value))
}

/// Short, stable correlation hash: first 8 bytes of SHA-256, base64 encoded
fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default())
}
