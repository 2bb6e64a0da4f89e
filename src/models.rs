use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config, ledger::store::LedgerStore, mailer::MailSender, mapping::FieldMapper,
    submissions::SubmissionSource,
};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One row of the inbox ledger. `email` is the primary identity and is always
/// stored lower-cased and validated; the other contact fields may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub phone: String,
    pub message: String,
    pub source_form: String,
    pub submitted_at: DateTime<Utc>,
    pub exported: bool,
}

/// Output of the field mapper: a contact without ledger metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub phone: String,
    pub message: String,
}

/// One raw field of a form submission. Array-like values are joined with
/// ", " before they reach the mapper.
#[derive(Debug, Clone)]
pub struct RawField {
    pub label: String,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct FormMeta {
    pub form_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeMode {
    Email,
    EmailPhone,
}

impl DedupeMode {
    /// Batch dedupe key: lower-cased email, with the canonical phone appended
    /// under the stricter mode.
    pub fn key(self, email: &str, phone: &str) -> String {
        match self {
            DedupeMode::Email => email.to_lowercase(),
            DedupeMode::EmailPhone => format!("{}|{}", email.to_lowercase(), phone),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    Email,
    Link,
}

/// Result code of an export flow. Failures are communicated through this
/// value plus the log, never by terminating the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Done,
    Empty,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillStats {
    pub added: usize,
    pub no_email: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupStats {
    pub ledger_purged: usize,
    pub files_deleted: usize,
}

pub struct App {
    pub config: Config,
    pub store: Box<dyn LedgerStore>,
    pub mailer: Box<dyn MailSender>,
    pub source: Box<dyn SubmissionSource>,
    pub mapper: FieldMapper,
}
