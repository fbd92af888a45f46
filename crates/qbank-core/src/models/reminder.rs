use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::offset::RelativeOffset;

use super::bank::BankId;

/// FHIR request status of a configured reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RequestStatus {
    Draft,
    Active,
    Suspended,
    Cancelled,
    Completed,
    EnteredInError,
    Unknown,
}

/// A reminder configured on a bank, fired `notify_post_start` after the start
/// of the active iteration.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReminderRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: RequestStatus,
    pub notify_post_start: RelativeOffset,
    /// Restrict to one iteration; `None` applies to every iteration.
    #[serde(default)]
    pub iteration: Option<u32>,
}

impl ReminderRequest {
    pub fn is_active(&self) -> bool {
        self.status == RequestStatus::Active
    }

    pub fn applies_to(&self, iteration: u32) -> bool {
        self.iteration.is_none_or(|only| only == iteration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReminderState {
    /// Ready for dispatch.
    Prepared,
    /// Superseded by a later reminder for the same iteration; kept for audit.
    Suspended,
    Sent,
}

/// A reminder queued for a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReminderRecord {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub bank_id: BankId,
    pub request_id: String,
    pub offset: RelativeOffset,
    pub iteration: u32,
    pub fire_at: Timestamp,
    pub state: ReminderState,
    pub created_at: Timestamp,
}

/// Uniqueness key: one reminder per subject, bank, offset and iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub subject_id: Uuid,
    pub bank_id: BankId,
    pub offset: RelativeOffset,
    pub iteration: u32,
}

impl ReminderRecord {
    pub fn key(&self) -> ReminderKey {
        ReminderKey {
            subject_id: self.subject_id,
            bank_id: self.bank_id.clone(),
            offset: self.offset,
            iteration: self.iteration,
        }
    }
}
