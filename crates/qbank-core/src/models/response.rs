use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle tag of a questionnaire response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Amended,
    EnteredInError,
    Stopped,
}

/// A subject's response to one instrument. Appended externally, read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseRecord {
    pub subject_id: Uuid,
    /// Reference to the answered questionnaire, e.g.
    /// `https://example.org/api/questionnaires/epic26`.
    pub questionnaire_reference: String,
    pub status: ResponseStatus,
    pub authored: Timestamp,
}

impl ResponseRecord {
    /// Whether this response belongs to the named instrument.
    ///
    /// Matches on the trailing part of the reference so that versioned
    /// references sharing a logical name all count. This is looser than an
    /// exact key match: `xepic26` also matches `epic26`.
    pub fn references(&self, instrument: &str) -> bool {
        self.questionnaire_reference.ends_with(instrument)
    }
}
