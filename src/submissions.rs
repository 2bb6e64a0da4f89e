// The forms backend is an optional collaborator: it may simply not be there.
// Callers check availability first and get empty data rather than errors when
// it is missing.

use serde::Deserialize;
use tracing::warn;

use chrono::{DateTime, Utc};

use crate::models::{RawField, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct StoredForm {
    #[serde(default)]
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub submissions: Vec<StoredSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredSubmission {
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: Vec<StoredField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredField {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: StoredValue,
}

/// Stored values are scalars or arrays; arrays are joined with ", " on the
/// way into the mapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Text(String),
    Many(Vec<String>),
}

impl Default for StoredValue {
    fn default() -> Self {
        StoredValue::Text(String::new())
    }
}

impl StoredValue {
    pub fn joined(&self) -> String {
        match self {
            StoredValue::Text(s) => s.clone(),
            StoredValue::Many(items) => items.join(", "),
        }
    }
}

impl StoredField {
    pub fn to_raw(&self) -> RawField {
        RawField {
            label: self.label.clone(),
            key: self.key.clone(),
            value: self.value.joined(),
        }
    }
}

/// Pull interface over the forms backend's stored history, used by backfill.
#[async_trait::async_trait]
pub trait SubmissionSource: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn forms(&self) -> Result<Vec<StoredForm>>;
    async fn submissions(&self, form_id: u32) -> Result<Vec<StoredSubmission>>;
}

#[derive(Debug, Clone, Deserialize)]
struct HistoryFile {
    forms: Vec<StoredForm>,
}

/// YAML-file-backed submission history.
pub struct YamlSubmissionSource {
    forms: Vec<StoredForm>,
    available: bool,
}

#[async_trait::async_trait]
impl SubmissionSource for YamlSubmissionSource {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn forms(&self) -> Result<Vec<StoredForm>> {
        Ok(self.forms.clone())
    }

    async fn submissions(&self, form_id: u32) -> Result<Vec<StoredSubmission>> {
        Ok(self
            .forms
            .iter()
            .find(|form| form.id == form_id)
            .map(|form| form.submissions.clone())
            .unwrap_or_default())
    }
}

/// Load the stored history file. A missing or unparsable file yields an
/// unavailable source, not an error.
pub async fn load_history_source(path: &str) -> YamlSubmissionSource {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(_) => {
            return YamlSubmissionSource {
                forms: Vec::new(),
                available: false,
            }
        }
    };
    match serde_yaml::from_str::<HistoryFile>(&content) {
        Ok(history) => YamlSubmissionSource {
            forms: history.forms,
            available: true,
        },
        Err(e) => {
            warn!("could not parse submission history {path}: {e}");
            YamlSubmissionSource {
                forms: Vec::new(),
                available: false,
            }
        }
    }
}

#[cfg(test)]
pub mod tests_support {
    use super::*;

    pub fn fixed(forms: Vec<StoredForm>) -> YamlSubmissionSource {
        YamlSubmissionSource {
            forms,
            available: true,
        }
    }

    pub fn unavailable() -> YamlSubmissionSource {
        YamlSubmissionSource {
            forms: Vec::new(),
            available: false,
        }
    }
}
