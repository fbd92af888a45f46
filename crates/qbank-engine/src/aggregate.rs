use jiff::Timestamp;

use qbank_core::models::status::{InstrumentStatus, OverallStatus};

/// Collapse per-instrument statuses into one subject-level status.
///
/// Completed only when every instrument is. A shared status is reported as
/// is, except that all-in-progress with no deadline left is Partially
/// Completed. Mixed statuses with anything expired are Partially Completed,
/// otherwise In Progress. An empty set is Expired.
pub fn aggregate(statuses: &[InstrumentStatus]) -> OverallStatus {
    let Some(first) = statuses.first().map(InstrumentStatus::effective) else {
        return OverallStatus::Expired;
    };

    if statuses.iter().all(|s| s.effective() == first) {
        if first == OverallStatus::InProgress && statuses.iter().all(|s| s.by_date.is_none()) {
            return OverallStatus::PartiallyCompleted;
        }
        return first;
    }

    if statuses.iter().any(|s| s.effective() == OverallStatus::Expired) {
        OverallStatus::PartiallyCompleted
    } else {
        OverallStatus::InProgress
    }
}

/// Aggregate the active window's statuses, or report Expired when the subject
/// has no window at all (no trigger, or nothing started or applicable).
pub fn aggregate_or_expired(statuses: Option<&[InstrumentStatus]>) -> OverallStatus {
    match statuses {
        Some(statuses) => aggregate(statuses),
        None => OverallStatus::Expired,
    }
}

/// Most recent completion time across instruments.
pub fn completed_date(statuses: &[InstrumentStatus]) -> Option<Timestamp> {
    statuses.iter().filter_map(|s| s.completed).max()
}

/// Deadline of the first instrument, in bank order, that still has one.
pub fn next_due_date(statuses: &[InstrumentStatus]) -> Option<Timestamp> {
    statuses.iter().find_map(|s| s.by_date)
}
