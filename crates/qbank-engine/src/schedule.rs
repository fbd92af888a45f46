use std::cmp::Ordering;

use jiff::Timestamp;
use tracing::debug;

use qbank_core::models::bank::{BankId, Classification, QuestionnaireBank};
use qbank_core::offset::RelativeOffset;

use crate::error::ScheduleError;

/// The concrete window of one bank iteration.
///
/// Bounds are inclusive at `start` and exclusive at `overdue` and `expired`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveWindow {
    pub bank_id: BankId,
    pub classification: Classification,
    pub iteration: u32,
    pub start: Timestamp,
    pub overdue: Option<Timestamp>,
    pub expired: Timestamp,
}

impl ActiveWindow {
    pub fn contains(&self, now: Timestamp) -> bool {
        self.start <= now && now < self.expired
    }
}

/// Resolve the iteration of `bank` that applies at `now`.
///
/// Baseline and indefinite banks only have iteration 0, which keeps applying
/// after it expires. Recurring banks try their base window, then each
/// recurrence rule in order; iteration numbers continue across rules.
pub fn active_iteration(
    bank: &QuestionnaireBank,
    trigger: Timestamp,
    now: Timestamp,
) -> Result<ActiveWindow, ScheduleError> {
    let base = window_at(bank, 0, trigger, bank.start)?;
    if now < base.start {
        return Err(ScheduleError::NotYetStarted { start: base.start });
    }

    match bank.classification {
        Classification::Baseline | Classification::Indefinite => Ok(base),
        Classification::Recurring => {
            if base.contains(now) {
                return Ok(base);
            }

            let mut preceding = 0;
            for rule in &bank.recurrences {
                if let Some(n) = rule.cycle_containing(trigger, now)? {
                    let cycle_start = rule.nth_cycle_start(trigger, n)?;
                    let window = window_at(bank, 1 + preceding + n, cycle_start, RelativeOffset::ZERO)?;
                    if window.contains(now) {
                        return Ok(window);
                    }
                    debug!(
                        bank = %bank.id,
                        iteration = window.iteration,
                        expired = %window.expired,
                        "between recurrence cycles"
                    );
                }
                preceding += rule.cycle_count(trigger)?;
            }
            Err(ScheduleError::NotApplicable { now })
        }
    }
}

/// Build the window for `iteration`, anchored at `anchor`.
///
/// The bank's overdue and expired offsets are measured from the anchor.
/// Indefinite banks never go overdue, and without an expiry stay open.
fn window_at(
    bank: &QuestionnaireBank,
    iteration: u32,
    anchor: Timestamp,
    start: RelativeOffset,
) -> Result<ActiveWindow, ScheduleError> {
    let overdue = match (bank.classification, bank.overdue) {
        (Classification::Indefinite, _) | (_, None) => None,
        (_, Some(offset)) => Some(offset.apply(anchor)?),
    };
    let expired = match bank.expired {
        Some(offset) => offset.apply(anchor)?,
        None => Timestamp::MAX,
    };
    Ok(ActiveWindow {
        bank_id: bank.id.clone(),
        classification: bank.classification,
        iteration,
        start: start.apply(anchor)?,
        overdue,
        expired,
    })
}

/// Pick the most current window across a subject's baseline and recurring
/// banks.
///
/// Windows containing `now` win over ones that do not; among those the latest
/// start wins, then baseline over recurring, then declared order. With no
/// containing window the latest-started resolved window (an expired baseline)
/// is returned. Indefinite banks are never current.
pub fn current_window<'a, F>(
    banks: impl IntoIterator<Item = &'a QuestionnaireBank>,
    trigger_of: F,
    now: Timestamp,
) -> Option<(&'a QuestionnaireBank, ActiveWindow)>
where
    F: Fn(&QuestionnaireBank) -> Option<Timestamp>,
{
    let resolved: Vec<(usize, &QuestionnaireBank, ActiveWindow)> = banks
        .into_iter()
        .enumerate()
        .filter(|(_, bank)| bank.classification != Classification::Indefinite)
        .filter_map(|(position, bank)| {
            let window = resolve(bank, trigger_of(bank)?, now)?;
            Some((position, bank, window))
        })
        .collect();

    let most_current = |candidates: Vec<&(usize, &'a QuestionnaireBank, ActiveWindow)>| {
        candidates
            .into_iter()
            .max_by(|a, b| precedence(a, b))
            .map(|(_, bank, window)| (*bank, window.clone()))
    };

    let containing: Vec<_> = resolved.iter().filter(|(_, _, w)| w.contains(now)).collect();
    if containing.is_empty() {
        most_current(resolved.iter().collect())
    } else {
        most_current(containing)
    }
}

/// The subject's indefinite bank window, if one has started.
pub fn indefinite_window<'a, F>(
    banks: impl IntoIterator<Item = &'a QuestionnaireBank>,
    trigger_of: F,
    now: Timestamp,
) -> Option<(&'a QuestionnaireBank, ActiveWindow)>
where
    F: Fn(&QuestionnaireBank) -> Option<Timestamp>,
{
    banks
        .into_iter()
        .filter(|bank| bank.classification == Classification::Indefinite)
        .find_map(|bank| Some((bank, resolve(bank, trigger_of(bank)?, now)?)))
}

fn resolve(bank: &QuestionnaireBank, trigger: Timestamp, now: Timestamp) -> Option<ActiveWindow> {
    match active_iteration(bank, trigger, now) {
        Ok(window) => Some(window),
        Err(err) => {
            debug!(bank = %bank.id, error = %err, "bank has no active window");
            None
        }
    }
}

fn precedence(
    a: &(usize, &QuestionnaireBank, ActiveWindow),
    b: &(usize, &QuestionnaireBank, ActiveWindow),
) -> Ordering {
    let baseline = |w: &ActiveWindow| w.classification == Classification::Baseline;
    a.2.start
        .cmp(&b.2.start)
        .then(baseline(&a.2).cmp(&baseline(&b.2)))
        .then(b.0.cmp(&a.0))
}
