// Retention sweeper: exported ledger rows age out after 90 days, generated
// CSV files after 180. Unexported rows are never touched here.

use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use crate::models::Result;

pub const LEDGER_RETENTION_DAYS: i64 = 90;
pub const CSV_RETENTION_DAYS: i64 = 180;

/// Delete CSV files under `dir` whose modification time is older than the
/// cutoff. Returns the number deleted. A missing directory counts as zero.
pub async fn sweep_csv_files(dir: &Path, cutoff: SystemTime) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut deleted = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if modified < cutoff && tokio::fs::remove_file(&path).await.is_ok() {
            deleted += 1;
        }
    }
    Ok(deleted)
}
