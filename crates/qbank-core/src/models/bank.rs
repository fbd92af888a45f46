use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::offset::RelativeOffset;
use crate::recurrence::RecurrenceRule;

use super::reminder::ReminderRequest;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct BankId(pub String);

impl BankId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BankId {
    fn from(value: &str) -> Self {
        BankId(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Classification {
    /// A single window, iteration 0 only.
    Baseline,
    /// One ever-open window.
    Indefinite,
    /// The base window followed by recurrence cycles.
    Recurring,
}

/// The owner a bank is attached to. Subjects reach banks through the scopes
/// they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BankScope {
    Organization(String),
    Intervention(String),
}

impl fmt::Display for BankScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankScope::Organization(id) => write!(f, "organization/{id}"),
            BankScope::Intervention(id) => write!(f, "intervention/{id}"),
        }
    }
}

/// A bundle of instruments sharing one applicability schedule.
///
/// `start`, `overdue` and `expired` are offsets from the trigger for the base
/// window, and from each cycle start for recurrence cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionnaireBank {
    pub id: BankId,
    pub classification: Classification,
    pub scope: BankScope,
    #[serde(default)]
    pub start: RelativeOffset,
    #[serde(default)]
    pub overdue: Option<RelativeOffset>,
    #[serde(default)]
    pub expired: Option<RelativeOffset>,
    /// Instrument names in display order.
    pub instruments: Vec<String>,
    #[serde(default)]
    pub recurrences: Vec<RecurrenceRule>,
    #[serde(default)]
    pub reminders: Vec<ReminderRequest>,
}

impl QuestionnaireBank {
    pub fn includes(&self, instrument: &str) -> bool {
        self.instruments.iter().any(|name| name == instrument)
    }
}
