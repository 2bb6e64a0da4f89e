use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use crate::models::{ContactRecord, Result};

/// Persistence seam for the inbox ledger. The whole collection is loaded and
/// saved as one opaque blob; there is no partial update.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load(&self) -> Result<Vec<ContactRecord>>;
    async fn save(&self, records: &[ContactRecord]) -> Result<()>;
}

/// JSON file implementation. A missing file reads as an empty ledger; saves
/// go through a temp file plus rename so a crash never leaves a torn blob.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl LedgerStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<ContactRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("ledger file not found, starting empty: {:?}", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    async fn save(&self, records: &[ContactRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("ledger saved ({} records)", records.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn missing_file_loads_as_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("ledger.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("ledger.json"));
        let records = vec![ContactRecord {
            email: "anna@example.se".to_string(),
            first_name: "Anna".to_string(),
            last_name: "Svensson".to_string(),
            company: String::new(),
            phone: "+46701234567".to_string(),
            message: "Hej".to_string(),
            source_form: "Contact".to_string(),
            submitted_at: Utc::now(),
            exported: false,
        }];
        store.save(&records).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].email, "anna@example.se");
        assert!(!loaded[0].exported);
    }
}
