use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::offset::RelativeOffset;

/// One recurring cycle regime of a questionnaire bank.
///
/// Cycle `n` starts at `trigger + start + n * cycle_length`. No cycle starts
/// after `trigger + termination`; the last one may start exactly on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(try_from = "RecurrenceSpec")]
#[ts(export)]
pub struct RecurrenceRule {
    start: RelativeOffset,
    cycle_length: RelativeOffset,
    termination: RelativeOffset,
}

/// Unvalidated wire shape of a [`RecurrenceRule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecurrenceSpec {
    start: RelativeOffset,
    cycle_length: RelativeOffset,
    termination: RelativeOffset,
}

impl TryFrom<RecurrenceSpec> for RecurrenceRule {
    type Error = CoreError;

    fn try_from(spec: RecurrenceSpec) -> Result<Self, Self::Error> {
        RecurrenceRule::new(spec.start, spec.cycle_length, spec.termination)
    }
}

impl RecurrenceRule {
    pub fn new(
        start: RelativeOffset,
        cycle_length: RelativeOffset,
        termination: RelativeOffset,
    ) -> Result<Self, CoreError> {
        if !cycle_length.is_positive_duration() {
            return Err(CoreError::MalformedOffset(format!(
                "cycle_length {cycle_length} must be a positive duration"
            )));
        }
        Ok(Self {
            start,
            cycle_length,
            termination,
        })
    }

    pub fn start(&self) -> RelativeOffset {
        self.start
    }

    pub fn cycle_length(&self) -> RelativeOffset {
        self.cycle_length
    }

    pub fn termination(&self) -> RelativeOffset {
        self.termination
    }

    /// Absolute end of this rule for the given trigger.
    pub fn terminates_at(&self, trigger: Timestamp) -> Result<Timestamp, CoreError> {
        self.termination.apply(trigger)
    }

    pub fn nth_cycle_start(&self, trigger: Timestamp, n: u32) -> Result<Timestamp, CoreError> {
        let first = self.start.apply(trigger)?;
        self.cycle_length.times(n)?.apply(first)
    }

    /// The latest cycle started by `now`.
    ///
    /// `None` before the first cycle starts, or when no cycle starts before
    /// the termination. A cycle may start exactly at the termination. Past
    /// the termination the last cycle is returned; whether its window is
    /// still open is for the caller to judge.
    pub fn cycle_containing(
        &self,
        trigger: Timestamp,
        now: Timestamp,
    ) -> Result<Option<u32>, CoreError> {
        let first = self.start.apply(trigger)?;
        let termination = self.terminates_at(trigger)?;
        if now < first || first > termination {
            return Ok(None);
        }
        let cycles = self.walk_cycles(trigger, first, |next| next <= now && next <= termination)?;
        Ok(Some(cycles - 1))
    }

    /// Number of cycles this rule produces before its termination.
    pub fn cycle_count(&self, trigger: Timestamp) -> Result<u32, CoreError> {
        let first = self.start.apply(trigger)?;
        let termination = self.terminates_at(trigger)?;
        if first > termination {
            return Ok(0);
        }
        self.walk_cycles(trigger, first, |next| next <= termination)
    }

    /// Count cycles from the first one while `accept` holds for the next
    /// cycle start. Stops if cycle starts fail to advance.
    fn walk_cycles(
        &self,
        trigger: Timestamp,
        first: Timestamp,
        accept: impl Fn(Timestamp) -> bool,
    ) -> Result<u32, CoreError> {
        let mut count = 1;
        let mut previous = first;
        loop {
            let next = self.nth_cycle_start(trigger, count)?;
            if next <= previous || !accept(next) {
                return Ok(count);
            }
            previous = next;
            count += 1;
        }
    }
}
