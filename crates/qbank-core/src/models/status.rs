use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::bank::BankId;

/// Window state of a single instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum InstrumentState {
    Completed,
    Due,
    Overdue,
    Expired,
}

/// Subject-level status, and the effective status of one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OverallStatus {
    Completed,
    Due,
    Overdue,
    Expired,
    InProgress,
    PartiallyCompleted,
}

impl OverallStatus {
    /// Whether the subject still has work to do inside an open window.
    pub fn is_outstanding(&self) -> bool {
        matches!(
            self,
            OverallStatus::Due | OverallStatus::Overdue | OverallStatus::InProgress
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            OverallStatus::Completed => "Completed",
            OverallStatus::Due => "Due",
            OverallStatus::Overdue => "Overdue",
            OverallStatus::Expired => "Expired",
            OverallStatus::InProgress => "In Progress",
            OverallStatus::PartiallyCompleted => "Partially Completed",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<InstrumentState> for OverallStatus {
    fn from(state: InstrumentState) -> Self {
        match state {
            InstrumentState::Completed => OverallStatus::Completed,
            InstrumentState::Due => OverallStatus::Due,
            InstrumentState::Overdue => OverallStatus::Overdue,
            InstrumentState::Expired => OverallStatus::Expired,
        }
    }
}

/// Computed status of one instrument in the active window. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InstrumentStatus {
    pub instrument: String,
    pub state: InstrumentState,
    /// Authored time of the most recent completed response.
    pub completed: Option<Timestamp>,
    /// Deadline of the current due or overdue period.
    pub by_date: Option<Timestamp>,
    /// Authored time of the most recent in-progress response.
    pub in_progress: Option<Timestamp>,
}

impl InstrumentStatus {
    /// Status used for aggregation: started but unfinished work reads as
    /// In Progress whatever the window state.
    pub fn effective(&self) -> OverallStatus {
        if self.state != InstrumentState::Completed && self.in_progress.is_some() {
            OverallStatus::InProgress
        } else {
            self.state.into()
        }
    }
}

/// Which banks a listing call considers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ClassificationFilter {
    /// The subject's most current bank.
    #[default]
    Current,
    /// The subject's indefinite bank only.
    Indefinite,
    /// Current and indefinite together.
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AttentionList {
    /// Instruments not yet started whose window is still open.
    pub needing_full_assessment: Vec<String>,
    /// Started instruments that can still be resumed.
    pub in_progress: Vec<String>,
}

/// Full status detail for a subject's most current bank.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AssessmentReport {
    pub subject_id: Uuid,
    pub bank_id: Option<BankId>,
    pub iteration: Option<u32>,
    pub instruments: Vec<InstrumentStatus>,
    pub overall: OverallStatus,
    pub completed_date: Option<Timestamp>,
    pub next_due_date: Option<Timestamp>,
}
