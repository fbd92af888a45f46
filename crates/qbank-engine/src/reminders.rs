use std::collections::HashSet;

use jiff::Timestamp;
use tracing::debug;
use uuid::Uuid;

use qbank_core::models::bank::QuestionnaireBank;
use qbank_core::models::reminder::{ReminderKey, ReminderRecord, ReminderState};
use qbank_core::models::status::OverallStatus;

use crate::error::ScheduleError;
use crate::schedule::ActiveWindow;

/// Decide which of the bank's configured reminders are newly owed.
///
/// A reminder is owed when its request is active and covers the window's
/// iteration, no reminder exists yet for its (subject, bank, offset,
/// iteration), the subject still has outstanding work, and its fire time
/// `window.start + offset` has already passed. Future reminders are left for a
/// later call.
///
/// When several come due in one pass only the one firing last stays
/// `Prepared`; the others are returned `Suspended` so the subject is not
/// flooded with stale reminders.
pub fn due_reminders(
    subject_id: Uuid,
    bank: &QuestionnaireBank,
    window: &ActiveWindow,
    overall: OverallStatus,
    existing: &[ReminderRecord],
    now: Timestamp,
) -> Result<Vec<ReminderRecord>, ScheduleError> {
    if !overall.is_outstanding() {
        debug!(%subject_id, %overall, "no outstanding work; reminders not needed");
        return Ok(Vec::new());
    }

    let mut claimed: HashSet<ReminderKey> = existing.iter().map(ReminderRecord::key).collect();
    let mut queued = Vec::new();

    for request in &bank.reminders {
        if !request.is_active() {
            debug!(request = %request.id, "inactive request, skipping");
            continue;
        }
        if !request.applies_to(window.iteration) {
            debug!(request = %request.id, iteration = window.iteration, "iteration mismatch");
            continue;
        }

        let key = ReminderKey {
            subject_id,
            bank_id: bank.id.clone(),
            offset: request.notify_post_start,
            iteration: window.iteration,
        };
        if claimed.contains(&key) {
            debug!(request = %request.id, "reminder already queued");
            continue;
        }

        let fire_at = request.notify_post_start.apply(window.start)?;
        if fire_at >= now {
            debug!(request = %request.id, %fire_at, "reminder not yet due");
            continue;
        }

        debug!(request = %request.id, %fire_at, "reminder due");
        claimed.insert(key);
        queued.push(ReminderRecord {
            id: Uuid::new_v4(),
            subject_id,
            bank_id: bank.id.clone(),
            request_id: request.id.clone(),
            offset: request.notify_post_start,
            iteration: window.iteration,
            fire_at,
            state: ReminderState::Prepared,
            created_at: now,
        });
    }

    suspend_all_but_latest(&mut queued);
    Ok(queued)
}

fn suspend_all_but_latest(queued: &mut [ReminderRecord]) {
    if queued.len() < 2 {
        return;
    }
    debug!(count = queued.len(), "several reminders due at once; suspending all but the latest");

    let mut latest = 0;
    for (index, record) in queued.iter().enumerate().skip(1) {
        if record.fire_at > queued[latest].fire_at {
            latest = index;
        }
    }
    for (index, record) in queued.iter_mut().enumerate() {
        if index != latest {
            record.state = ReminderState::Suspended;
        }
    }
}
