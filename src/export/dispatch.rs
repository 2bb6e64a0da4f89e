// Export flows. The ordering contract: build rows from a ledger snapshot,
// write file(s), deliver, and only then flip exported flags. Any failure
// before the flip leaves the ledger untouched, so the next run recomputes
// the same batch.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use super::csv_sink::write_csv_file;
use super::{build_rows, build_split_rows, ContactRow};
use crate::cleanup::{self, CSV_RETENTION_DAYS, LEDGER_RETENTION_DAYS};
use crate::ledger::{self, CaptureOutcome};
use crate::models::{
    App, BackfillStats, CleanupStats, DeliveryMode, ExportOutcome, FormMeta, RawField, Result,
};

impl App {
    /// Scheduled entry point: single or split export per configuration,
    /// delivered by mail or left as a file depending on the delivery mode.
    pub async fn run_digest(&self) -> Result<ExportOutcome> {
        let send = self.config.delivery.mode == DeliveryMode::Email;
        if self.config.export.split_mode {
            self.generate_split(send).await
        } else {
            self.generate_single(send).await
        }
    }

    /// Push entry point for one live submission.
    pub async fn on_submission(&self, fields: &[RawField], meta: &FormMeta) -> Result<CaptureOutcome> {
        let settings = self.config.export_settings();
        let mut records = self.store.load().await?;
        let draft = self.mapper.map_fields(fields, &settings.allowed_tlds);
        let now = Utc::now();
        let outcome = ledger::capture(&mut records, draft, &meta.form_title, now, now);
        if outcome == CaptureOutcome::Added {
            self.store.save(&records).await?;
        }
        Ok(outcome)
    }

    /// One CSV of the unexported backlog.
    pub async fn generate_single(&self, send: bool) -> Result<ExportOutcome> {
        let settings = self.config.export_settings();
        let mut records = self.store.load().await?;
        let batch = build_rows(&records, settings.dedupe_mode, false);
        if batch.rows.is_empty() {
            info!("nothing to export");
            return Ok(ExportOutcome::Empty);
        }

        let path = match self.write_rows(&batch.rows, "").await {
            Some(path) => path,
            None => return Ok(ExportOutcome::Failed),
        };

        if send {
            let body = digest_body(&format!("{} contacts", batch.rows.len()));
            let delivered = self
                .mailer
                .send(
                    &self.config.delivery.recipient,
                    &self.config.delivery.subject,
                    &body,
                    &[path],
                )
                .await;
            if !delivered {
                warn!("delivery failed, records left unexported");
                return Ok(ExportOutcome::Failed);
            }
        }

        ledger::mark_exported(&mut records, &batch.emails);
        self.store.save(&records).await?;
        info!("{} records marked exported", batch.emails.len());
        Ok(ExportOutcome::Done)
    }

    /// Two CSVs, personal and business, of the unexported backlog.
    pub async fn generate_split(&self, send: bool) -> Result<ExportOutcome> {
        let settings = self.config.export_settings();
        let mut records = self.store.load().await?;
        let batch = build_split_rows(
            &records,
            settings.dedupe_mode,
            &settings.freemail_domains,
            false,
        );
        if batch.personal.is_empty() && batch.business.is_empty() {
            info!("nothing to export (split)");
            return Ok(ExportOutcome::Empty);
        }

        let mut paths = Vec::new();
        for (rows, suffix) in [(&batch.personal, "-private"), (&batch.business, "-company")] {
            if rows.is_empty() {
                continue;
            }
            match self.write_rows(rows, suffix).await {
                Some(path) => paths.push(path),
                None => return Ok(ExportOutcome::Failed),
            }
        }

        if send {
            let counts = format!(
                "private: {}, business: {}",
                batch.personal.len(),
                batch.business.len()
            );
            let subject = format!("{} (Private/Business)", self.config.delivery.subject);
            let delivered = self
                .mailer
                .send(
                    &self.config.delivery.recipient,
                    &subject,
                    &digest_body(&counts),
                    &paths,
                )
                .await;
            if !delivered {
                warn!("delivery failed (split), records left unexported");
                return Ok(ExportOutcome::Failed);
            }
        }

        ledger::mark_exported(&mut records, &batch.emails);
        self.store.save(&records).await?;
        info!("{} records marked exported", batch.emails.len());
        Ok(ExportOutcome::Done)
    }

    /// Full-history export, ignoring exported flags. Never mutates the ledger.
    pub async fn export_all(&self) -> Result<ExportOutcome> {
        let settings = self.config.export_settings();
        let records = self.store.load().await?;
        let batch = build_rows(&records, settings.dedupe_mode, true);
        if batch.rows.is_empty() {
            info!("ledger is empty, nothing to export");
            return Ok(ExportOutcome::Empty);
        }
        match self.write_rows(&batch.rows, "-ALL").await {
            Some(_) => Ok(ExportOutcome::Done),
            None => Ok(ExportOutcome::Failed),
        }
    }

    pub async fn run_backfill(&self) -> Result<BackfillStats> {
        let settings = self.config.export_settings();
        let mut records = self.store.load().await?;
        let stats = ledger::backfill(
            &mut records,
            self.source.as_ref(),
            &self.mapper,
            &settings,
            Utc::now(),
        )
        .await?;
        if stats.added > 0 {
            self.store.save(&records).await?;
        }
        Ok(stats)
    }

    pub async fn reset_ledger(&self) -> Result<usize> {
        let mut records = self.store.load().await?;
        let reset = ledger::reset_all(&mut records);
        self.store.save(&records).await?;
        info!("export marks reset on {reset} records");
        Ok(reset)
    }

    pub async fn run_cleanup(&self) -> Result<CleanupStats> {
        let now = Utc::now();
        let mut records = self.store.load().await?;
        let purged = ledger::purge_expired(&mut records, now - Duration::days(LEDGER_RETENTION_DAYS));
        if purged > 0 {
            self.store.save(&records).await?;
        }
        let file_cutoff = std::time::SystemTime::now()
            - std::time::Duration::from_secs(CSV_RETENTION_DAYS as u64 * 24 * 3600);
        let deleted =
            cleanup::sweep_csv_files(Path::new(&self.config.storage.csv_directory), file_cutoff)
                .await?;
        info!("cleanup done: {purged} ledger records purged, {deleted} csv files deleted");
        Ok(CleanupStats {
            ledger_purged: purged,
            files_deleted: deleted,
        })
    }

    async fn write_rows(&self, rows: &[ContactRow], suffix: &str) -> Option<PathBuf> {
        let dir = Path::new(&self.config.storage.csv_directory);
        match write_csv_file(dir, rows, suffix, Utc::now()).await {
            Ok(path) => path,
            Err(e) => {
                error!("could not write csv: {e}");
                None
            }
        }
    }
}

fn digest_body(counts: &str) -> String {
    format!(
        "Hello,\n\nAttached is the contacts CSV ({counts}).\n\n\
         Columns: Email Address, First Name, Last Name, Company, Phone Number, \
         Message, Source Form, Submitted At.\n\nContact Sync\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::Utc;

    use crate::config::Config;
    use crate::ledger::store::{JsonFileStore, LedgerStore};
    use crate::mailer::MailSender;
    use crate::mapping::FieldMapper;
    use crate::models::ContactRecord;
    use crate::submissions;

    #[derive(Debug, Clone)]
    struct SentMail {
        to: String,
        body: String,
        attachments: Vec<PathBuf>,
    }

    struct MockSender {
        succeed: bool,
        sent: Arc<Mutex<Vec<SentMail>>>,
    }

    #[async_trait::async_trait]
    impl MailSender for MockSender {
        async fn send(&self, to: &str, _subject: &str, body: &str, attachments: &[PathBuf]) -> bool {
            self.sent.lock().unwrap().push(SentMail {
                to: to.to_string(),
                body: body.to_string(),
                attachments: attachments.to_vec(),
            });
            self.succeed
        }
    }

    fn record(email: &str, exported: bool) -> ContactRecord {
        ContactRecord {
            email: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            company: String::new(),
            phone: String::new(),
            message: String::new(),
            source_form: "Contact".to_string(),
            submitted_at: Utc::now(),
            exported,
        }
    }

    async fn app_with(
        dir: &std::path::Path,
        records: Vec<ContactRecord>,
        succeed: bool,
    ) -> (App, Arc<Mutex<Vec<SentMail>>>) {
        let store = JsonFileStore::new(dir.join("ledger.json"));
        store.save(&records).await.unwrap();

        let mut config = Config::default();
        config.storage.ledger_path = dir.join("ledger.json").to_string_lossy().into_owned();
        config.storage.csv_directory = dir.join("out").to_string_lossy().into_owned();
        config.delivery.recipient = "list@example.se".to_string();

        let sent = Arc::new(Mutex::new(Vec::new()));
        let app = App {
            config,
            store: Box::new(store),
            mailer: Box::new(MockSender {
                succeed,
                sent: Arc::clone(&sent),
            }),
            source: Box::new(submissions::tests_support::unavailable()),
            mapper: FieldMapper::new(),
        };
        (app, sent)
    }

    #[tokio::test]
    async fn successful_delivery_exports_only_pending_records() {
        let dir = tempfile::tempdir().unwrap();
        let (app, sent) = app_with(
            dir.path(),
            vec![record("alice@x.se", false), record("bob@y.se", true)],
            true,
        )
        .await;

        let outcome = app.generate_single(true).await.unwrap();
        assert_eq!(outcome, ExportOutcome::Done);

        let mails = sent.lock().unwrap();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].to, "list@example.se");
        assert!(mails[0].body.contains("1 contacts"));
        let csv = std::fs::read_to_string(&mails[0].attachments[0]).unwrap();
        assert!(csv.contains("alice@x.se"));
        assert!(!csv.contains("bob@y.se"));

        let records = app.store.load().await.unwrap();
        assert!(records.iter().find(|r| r.email == "alice@x.se").unwrap().exported);
        assert!(records.iter().find(|r| r.email == "bob@y.se").unwrap().exported);
    }

    #[tokio::test]
    async fn failed_delivery_leaves_batch_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _sent) = app_with(dir.path(), vec![record("alice@x.se", false)], false).await;

        assert_eq!(app.generate_single(true).await.unwrap(), ExportOutcome::Failed);
        let records = app.store.load().await.unwrap();
        assert!(!records[0].exported);

        // Second run recomputes the identical batch.
        let settings = app.config.export_settings();
        let retry = build_rows(&records, settings.dedupe_mode, false);
        assert_eq!(retry.emails, vec!["alice@x.se"]);
    }

    #[tokio::test]
    async fn link_mode_marks_exported_on_file_creation() {
        let dir = tempfile::tempdir().unwrap();
        let (app, sent) = app_with(dir.path(), vec![record("alice@x.se", false)], true).await;

        assert_eq!(app.generate_single(false).await.unwrap(), ExportOutcome::Done);
        assert!(sent.lock().unwrap().is_empty());
        assert!(app.store.load().await.unwrap()[0].exported);
    }

    #[tokio::test]
    async fn empty_backlog_is_a_distinct_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_with(dir.path(), vec![record("bob@y.se", true)], true).await;
        assert_eq!(app.generate_single(true).await.unwrap(), ExportOutcome::Empty);
    }

    #[tokio::test]
    async fn split_send_attaches_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let (mut app, sent) = app_with(
            dir.path(),
            vec![record("a@gmail.com", false), record("a@corp.io", false)],
            true,
        )
        .await;
        app.config.export.freemail_domains = "gmail.com".to_string();

        assert_eq!(app.generate_split(true).await.unwrap(), ExportOutcome::Done);
        let mails = sent.lock().unwrap();
        assert_eq!(mails[0].attachments.len(), 2);
        assert!(mails[0].body.contains("private: 1, business: 1"));
        assert!(app.store.load().await.unwrap().iter().all(|r| r.exported));
    }

    #[tokio::test]
    async fn export_all_never_mutates_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_with(
            dir.path(),
            vec![record("alice@x.se", false), record("bob@y.se", true)],
            true,
        )
        .await;

        assert_eq!(app.export_all().await.unwrap(), ExportOutcome::Done);
        let records = app.store.load().await.unwrap();
        assert!(!records.iter().find(|r| r.email == "alice@x.se").unwrap().exported);

        let all_file = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .find(|n| n.contains("-ALL-"))
            .unwrap();
        assert!(all_file.starts_with("contacts-"));
    }

    #[tokio::test]
    async fn on_submission_captures_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_with(dir.path(), Vec::new(), true).await;
        let fields = vec![RawField {
            label: "E-post".to_string(),
            key: String::new(),
            value: "anna@example.se".to_string(),
        }];
        let meta = FormMeta {
            form_title: "Contact form".to_string(),
        };

        let outcome = app.on_submission(&fields, &meta).await.unwrap();
        assert_eq!(outcome, CaptureOutcome::Added);

        // Same email again inside the window: dropped, nothing persisted twice.
        let outcome = app.on_submission(&fields, &meta).await.unwrap();
        assert_eq!(outcome, CaptureOutcome::DuplicateWindow);
        assert_eq!(app.store.load().await.unwrap().len(), 1);
    }
}
