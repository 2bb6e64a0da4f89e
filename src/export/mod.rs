// Batch building: select unexported records in ledger order, dedupe within
// the batch, and turn them into CSV rows. The split variant routes each
// surviving record to a personal or business bucket by email domain.

pub mod csv_sink;
pub mod dispatch;

use std::collections::HashSet;

use serde::Serialize;

use crate::models::{ContactRecord, DedupeMode};

/// One CSV row. Field order and serde renames define the fixed column layout.
#[derive(Debug, Clone, Serialize)]
pub struct ContactRow {
    #[serde(rename = "Email Address")]
    pub email: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Phone Number")]
    pub phone: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Source Form")]
    pub source_form: String,
    #[serde(rename = "Submitted At")]
    pub submitted_at: String,
}

#[derive(Debug, Default)]
pub struct ExportBatch {
    pub rows: Vec<ContactRow>,
    /// Lower-cased emails of every surviving row, for mark_exported after a
    /// confirmed delivery.
    pub emails: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SplitBatch {
    pub personal: Vec<ContactRow>,
    pub business: Vec<ContactRow>,
    pub emails: Vec<String>,
}

/// Single-file build. Filters to unexported records unless `include_exported`
/// is set (full-history export), then keeps the first record per dedupe key.
pub fn build_rows(
    records: &[ContactRecord],
    mode: DedupeMode,
    include_exported: bool,
) -> ExportBatch {
    let mut seen = HashSet::new();
    let mut batch = ExportBatch::default();
    for record in selected(records, include_exported) {
        if !seen.insert(mode.key(&record.email, &record.phone)) {
            continue;
        }
        batch.emails.push(record.email.to_lowercase());
        batch.rows.push(row_from(record));
    }
    batch
}

/// Split build: same dedupe pass, then personal/business routing by whether
/// the email's domain is in the freemail set.
pub fn build_split_rows(
    records: &[ContactRecord],
    mode: DedupeMode,
    freemail_domains: &HashSet<String>,
    include_exported: bool,
) -> SplitBatch {
    let mut seen = HashSet::new();
    let mut listed = HashSet::new();
    let mut batch = SplitBatch::default();
    for record in selected(records, include_exported) {
        if !seen.insert(mode.key(&record.email, &record.phone)) {
            continue;
        }
        let email = record.email.to_lowercase();
        let domain = email.rsplit('@').next().unwrap_or("");
        let row = row_from(record);
        if freemail_domains.contains(domain) {
            batch.personal.push(row);
        } else {
            batch.business.push(row);
        }
        if listed.insert(email.clone()) {
            batch.emails.push(email);
        }
    }
    batch
}

fn selected(
    records: &[ContactRecord],
    include_exported: bool,
) -> impl Iterator<Item = &ContactRecord> {
    records
        .iter()
        .filter(move |r| include_exported || !r.exported)
        .filter(|r| !r.email.is_empty())
}

fn row_from(record: &ContactRecord) -> ContactRow {
    ContactRow {
        email: csv_safe(&record.email.to_lowercase()),
        first_name: csv_safe(&record.first_name),
        last_name: csv_safe(&record.last_name),
        company: csv_safe(&record.company),
        phone: csv_safe(&record.phone),
        message: csv_safe(&record.message),
        source_form: csv_safe(&record.source_form),
        submitted_at: record.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Collapse CRLF and lone CR to LF; the CSV writer handles quoting.
fn csv_safe(value: &str) -> String {
    value.replace("\r\n", "\n").replace('\r', "\n")
}
