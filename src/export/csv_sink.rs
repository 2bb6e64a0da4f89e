use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use super::ContactRow;
use crate::models::Result;

/// Write one row set to a CSV file under `dir`.
///
/// The file starts with a UTF-8 BOM so spreadsheet tools pick the right
/// encoding, followed by the fixed header row. An empty row set produces no
/// file and returns `None`.
pub async fn write_csv_file(
    dir: &Path,
    rows: &[ContactRow],
    suffix: &str,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if rows.is_empty() {
        return Ok(None);
    }

    tokio::fs::create_dir_all(dir).await?;
    let filename = format!(
        "contacts-{}{}-{}.csv",
        now.format("%Y-%m"),
        suffix,
        random_suffix()
    );
    let path = dir.join(filename);

    let mut buf: Vec<u8> = vec![0xEF, 0xBB, 0xBF];
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    tokio::fs::write(&path, buf).await?;

    info!("csv created ({} rows): {:?}", rows.len(), path.file_name());
    Ok(Some(path))
}

fn random_suffix() -> String {
    (0..6).map(|_| fastrand::alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(email: &str, company: &str) -> ContactRow {
        ContactRow {
            email: email.to_string(),
            first_name: "Anna".to_string(),
            last_name: "Svensson".to_string(),
            company: company.to_string(),
            phone: "+46701234567".to_string(),
            message: String::new(),
            source_form: "Contact".to_string(),
            submitted_at: "2026-08-01 12:00:00".to_string(),
        }
    }

    #[tokio::test]
    async fn empty_row_set_produces_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let result = write_csv_file(dir.path(), &[], "", now).await.unwrap();
        assert!(result.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn file_has_bom_header_and_quoted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let now: DateTime<Utc> = "2026-08-15T10:00:00Z".parse().unwrap();
        let rows = vec![row("anna@example.se", "Svensson, Söner & Co")];
        let path = write_csv_file(dir.path(), &rows, "", now)
            .await
            .unwrap()
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let content = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Email Address,First Name,Last Name,Company,Phone Number,Message,Source Form,Submitted At"
        );
        let data = lines.next().unwrap();
        assert!(data.contains("\"Svensson, Söner & Co\""));
        assert!(data.starts_with("anna@example.se,"));
    }

    #[tokio::test]
    async fn filename_follows_the_convention() {
        let dir = tempfile::tempdir().unwrap();
        let now: DateTime<Utc> = "2026-08-15T10:00:00Z".parse().unwrap();
        let path = write_csv_file(dir.path(), &[row("a@b.se", "")], "-private", now)
            .await
            .unwrap()
            .unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("contacts-2026-08-private-"));
        assert!(name.ends_with(".csv"));
        // prefix + 6 random chars + ".csv"
        assert_eq!(name.len(), "contacts-2026-08-private-".len() + 6 + 4);
    }
}
