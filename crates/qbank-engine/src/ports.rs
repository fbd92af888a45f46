//! Collaborator interfaces the engine reads through.
//!
//! Implementations are expected to answer from an already-loaded view; none
//! of these calls should block on the network.

use jiff::Timestamp;
use uuid::Uuid;

use qbank_core::models::bank::{BankId, BankScope};
use qbank_core::models::reminder::ReminderRecord;
use qbank_core::models::response::ResponseRecord;
use qbank_core::models::status::OverallStatus;

use crate::error::StoreError;

/// Enrollment and trigger lookup.
pub trait SubjectDirectory: Send + Sync {
    /// The organizations and interventions the subject belongs to.
    fn scopes(&self, subject_id: Uuid) -> Vec<BankScope>;

    /// The event anchoring the schedule of banks in `scope`, if known.
    fn trigger(&self, subject_id: Uuid, scope: &BankScope) -> Option<Timestamp>;
}

pub trait ResponseSource: Send + Sync {
    fn responses(&self, subject_id: Uuid) -> Vec<ResponseRecord>;
}

pub trait ReminderStore: Send + Sync {
    fn reminders(&self, subject_id: Uuid) -> Result<Vec<ReminderRecord>, StoreError>;

    /// Insert a new reminder. Must fail with [`StoreError::Duplicate`] when one
    /// already exists for the same subject, bank, offset and iteration.
    fn insert(&self, record: ReminderRecord) -> Result<(), StoreError>;
}

/// Subject-level status as kept in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedStatus {
    pub overall: OverallStatus,
    pub bank_id: Option<BankId>,
    pub iteration: Option<u32>,
}

/// Cache of overall status keyed by subject id.
///
/// The engine never invalidates on its own; callers invalidate whenever a
/// subject's responses change.
pub trait StatusCache: Send + Sync {
    fn get(&self, subject_id: Uuid) -> Option<CachedStatus>;
    fn put(&self, subject_id: Uuid, status: CachedStatus);
    fn invalidate(&self, subject_id: Uuid);
}
