use std::collections::BTreeMap;

use jiff::Timestamp;
use uuid::Uuid;

use qbank_core::models::response::{ResponseRecord, ResponseStatus};

/// Most recent records looked at per instrument.
///
/// A performance cap, not a correctness guarantee: a status whose latest
/// record sits behind this many newer records of the same instrument is not
/// seen.
pub const DEFAULT_SCAN_LIMIT: usize = 9;

/// Most recent authored time per response status for one instrument.
pub type RecentStatuses = BTreeMap<ResponseStatus, Timestamp>;

/// Collect the latest authored time for each status among a subject's
/// responses to `instrument`.
///
/// Responses match when their questionnaire reference ends with the
/// instrument name. Only the `limit` most recently authored matches are
/// considered; on equal authored times the earlier record in `records` wins.
pub fn recent_statuses(
    records: &[ResponseRecord],
    subject_id: Uuid,
    instrument: &str,
    limit: usize,
) -> RecentStatuses {
    let mut matching: Vec<&ResponseRecord> = records
        .iter()
        .filter(|r| r.subject_id == subject_id && r.references(instrument))
        .collect();
    matching.sort_by(|a, b| b.authored.cmp(&a.authored));

    let mut recents = RecentStatuses::new();
    for record in matching.into_iter().take(limit) {
        recents.entry(record.status).or_insert(record.authored);
    }
    recents
}
