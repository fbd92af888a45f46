use jiff::Timestamp;

use qbank_core::models::response::ResponseStatus;
use qbank_core::models::status::{InstrumentState, InstrumentStatus};

use crate::error::ScheduleError;
use crate::resolver::RecentStatuses;
use crate::schedule::ActiveWindow;

/// Classify one instrument against its window at `now`.
///
/// A completed response is final whatever the window says. An in-progress
/// response is carried onto whichever window state applies, including
/// Expired. Asking before the window opens is a caller bug and fails with
/// [`ScheduleError::PrematureStatus`].
pub fn classify(
    instrument: &str,
    recents: &RecentStatuses,
    window: &ActiveWindow,
    now: Timestamp,
) -> Result<InstrumentStatus, ScheduleError> {
    if let Some(&completed) = recents.get(&ResponseStatus::Completed) {
        return Ok(InstrumentStatus {
            instrument: instrument.to_string(),
            state: InstrumentState::Completed,
            completed: Some(completed),
            by_date: None,
            in_progress: None,
        });
    }
    let in_progress = recents.get(&ResponseStatus::InProgress).copied();

    if now < window.start {
        return Err(ScheduleError::PrematureStatus {
            start: window.start,
            now,
        });
    }

    let (state, by_date) = match window.overdue {
        Some(overdue) if now < overdue => (InstrumentState::Due, Some(overdue)),
        None if now < window.expired => (InstrumentState::Due, Some(window.expired)),
        Some(_) if now < window.expired => (InstrumentState::Overdue, Some(window.expired)),
        _ => (InstrumentState::Expired, None),
    };

    Ok(InstrumentStatus {
        instrument: instrument.to_string(),
        state,
        completed: None,
        by_date,
        in_progress,
    })
}
