// Inbox ledger operations. The ledger itself is a plain `Vec<ContactRecord>`
// owned by the caller; persistence is the store's concern (see store.rs) and
// every mutation is a full load-modify-save cycle with a single active writer.

pub mod store;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::ExportSettings;
use crate::mapping::FieldMapper;
use crate::models::{BackfillStats, ContactDraft, ContactRecord, Result};
use crate::submissions::SubmissionSource;

pub const MAX_LEDGER_SIZE: usize = 50_000;

/// Anti-spam window for live captures. Independent of the configured dedupe
/// mode and keyed on email alone.
const CAPTURE_WINDOW_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Added,
    AtCapacity,
    MissingEmail,
    DuplicateWindow,
}

/// Append one live submission. Drops silently (logged) when the ledger is
/// full, the draft has no email, or the same email was captured within the
/// last 48 hours.
pub fn capture(
    records: &mut Vec<ContactRecord>,
    draft: ContactDraft,
    source_form: &str,
    submitted_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> CaptureOutcome {
    if records.len() >= MAX_LEDGER_SIZE {
        warn!("ledger full ({} records), submission ignored", records.len());
        return CaptureOutcome::AtCapacity;
    }
    if draft.email.is_empty() {
        info!("submission ignored: no valid email");
        return CaptureOutcome::MissingEmail;
    }

    let email_lower = draft.email.to_lowercase();
    for existing in records.iter() {
        if existing.email.to_lowercase() == email_lower
            && now.signed_duration_since(existing.submitted_at)
                < Duration::hours(CAPTURE_WINDOW_HOURS)
        {
            info!("duplicate within 48h window dropped: {}", draft.email);
            return CaptureOutcome::DuplicateWindow;
        }
    }

    info!("captured {} ({})", draft.email, source_form);
    records.push(record_from(draft, source_form, submitted_at));
    CaptureOutcome::Added
}

/// Bulk-ingest stored history from the submission source.
///
/// Duplicates are judged with the configured dedupe mode against an index
/// built once from the ledger snapshot at the start of the run and grown with
/// each accepted row. Stops entirely once capacity is reached. Original
/// submission timestamps are preserved; rows without one get `now`.
pub async fn backfill(
    records: &mut Vec<ContactRecord>,
    source: &dyn SubmissionSource,
    mapper: &FieldMapper,
    settings: &ExportSettings,
    now: DateTime<Utc>,
) -> Result<BackfillStats> {
    let mut stats = BackfillStats::default();

    if !source.is_available().await {
        warn!("backfill: submission source unavailable");
        return Ok(stats);
    }

    let mut seen: HashSet<String> = records
        .iter()
        .filter(|r| !r.email.is_empty())
        .map(|r| settings.dedupe_mode.key(&r.email, &r.phone))
        .collect();

    let forms = source.forms().await?;
    if forms.is_empty() {
        info!("backfill: no forms found");
        return Ok(stats);
    }

    'forms: for form in &forms {
        for submission in source.submissions(form.id).await? {
            if records.len() >= MAX_LEDGER_SIZE {
                warn!("backfill stopped: ledger at capacity");
                break 'forms;
            }

            let fields: Vec<_> = submission.fields.iter().map(|f| f.to_raw()).collect();
            let draft = mapper.map_fields(&fields, &settings.allowed_tlds);
            if draft.email.is_empty() {
                stats.no_email += 1;
                continue;
            }

            let key = settings.dedupe_mode.key(&draft.email, &draft.phone);
            if !seen.insert(key) {
                stats.duplicates += 1;
                continue;
            }

            let submitted_at = submission.submitted_at.unwrap_or(now);
            records.push(record_from(draft, &form.title, submitted_at));
            stats.added += 1;
        }
    }

    info!(
        "backfill done: +{}, no email: {}, duplicates: {}",
        stats.added, stats.no_email, stats.duplicates
    );
    Ok(stats)
}

/// Flip `exported` for every record whose email is in the given list
/// (case-insensitive). No-op on empty input.
pub fn mark_exported(records: &mut [ContactRecord], emails: &[String]) {
    if emails.is_empty() {
        return;
    }
    let set: HashSet<String> = emails.iter().map(|e| e.to_lowercase()).collect();
    for record in records.iter_mut() {
        if set.contains(&record.email.to_lowercase()) {
            record.exported = true;
        }
    }
}

/// Administrative escape hatch: force every record back to unexported.
/// Previously delivered contacts will reappear in the next export.
pub fn reset_all(records: &mut [ContactRecord]) -> usize {
    let mut reset = 0;
    for record in records.iter_mut() {
        if record.exported {
            record.exported = false;
            reset += 1;
        }
    }
    reset
}

/// Remove exported records older than the cutoff. Unexported records are
/// never removed regardless of age. Returns the number removed.
pub fn purge_expired(records: &mut Vec<ContactRecord>, cutoff: DateTime<Utc>) -> usize {
    let before = records.len();
    records.retain(|r| !r.exported || r.submitted_at > cutoff);
    before - records.len()
}

fn record_from(draft: ContactDraft, source_form: &str, submitted_at: DateTime<Utc>) -> ContactRecord {
    ContactRecord {
        email: draft.email,
        first_name: draft.first_name,
        last_name: draft.last_name,
        company: draft.company,
        phone: draft.phone,
        message: draft.message,
        source_form: source_form.to_string(),
        submitted_at,
        exported: false,
    }
}
