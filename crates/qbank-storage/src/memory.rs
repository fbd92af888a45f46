use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jiff::Timestamp;
use uuid::Uuid;

use qbank_core::models::bank::BankScope;
use qbank_core::models::reminder::{ReminderRecord, ReminderState};
use qbank_core::models::response::ResponseRecord;
use qbank_engine::error::StoreError;
use qbank_engine::ports::{ReminderStore, ResponseSource, SubjectDirectory};

use crate::error::StorageError;
use crate::snapshot::{Enrollment, Snapshot, SubjectRecord};

/// Process-local data view serving every engine port from one [`Snapshot`].
///
/// Reminder inserts are unique on (subject, bank, offset, iteration).
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            data: RwLock::new(snapshot),
        }
    }

    /// Copy of the current contents, for persisting.
    pub fn snapshot(&self) -> Snapshot {
        self.read().clone()
    }

    pub fn subjects(&self) -> Vec<Uuid> {
        self.read().subjects.iter().map(|s| s.id).collect()
    }

    /// Enroll a subject in a scope, or update the trigger of an existing
    /// enrollment.
    pub fn enroll(&self, subject_id: Uuid, scope: BankScope, trigger: Option<Timestamp>) {
        let mut data = self.write();
        let subject = match data.subjects.iter().position(|s| s.id == subject_id) {
            Some(position) => &mut data.subjects[position],
            None => {
                data.subjects.push(SubjectRecord {
                    id: subject_id,
                    enrollments: Vec::new(),
                });
                let last = data.subjects.len() - 1;
                &mut data.subjects[last]
            }
        };

        match subject.enrollments.iter_mut().find(|e| e.scope == scope) {
            Some(enrollment) => enrollment.trigger = trigger,
            None => subject.enrollments.push(Enrollment { scope, trigger }),
        }
        tracing::debug!(%subject_id, "enrollment updated");
    }

    /// Append a response. Callers must invalidate the subject's cached status.
    pub fn record_response(&self, record: ResponseRecord) {
        tracing::debug!(
            subject_id = %record.subject_id,
            reference = %record.questionnaire_reference,
            status = ?record.status,
            "response recorded"
        );
        self.write().responses.push(record);
    }

    pub fn insert_reminder(&self, record: ReminderRecord) -> Result<(), StorageError> {
        let mut data = self.write();
        let key = record.key();
        if data.reminders.iter().any(|r| r.key() == key) {
            return Err(StorageError::Duplicate {
                subject_id: record.subject_id,
                bank_id: record.bank_id,
                iteration: record.iteration,
            });
        }
        data.reminders.push(record);
        Ok(())
    }

    /// Move a reminder to a new state, e.g. once it has been dispatched.
    pub fn set_reminder_state(
        &self,
        reminder_id: Uuid,
        state: ReminderState,
    ) -> Result<(), StorageError> {
        let mut data = self.write();
        let reminder = data
            .reminders
            .iter_mut()
            .find(|r| r.id == reminder_id)
            .ok_or_else(|| StorageError::NotFound(format!("reminder {reminder_id}")))?;
        reminder.state = state;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SubjectDirectory for MemoryStore {
    fn scopes(&self, subject_id: Uuid) -> Vec<BankScope> {
        self.read()
            .subjects
            .iter()
            .find(|s| s.id == subject_id)
            .map(|s| s.enrollments.iter().map(|e| e.scope.clone()).collect())
            .unwrap_or_default()
    }

    fn trigger(&self, subject_id: Uuid, scope: &BankScope) -> Option<Timestamp> {
        self.read()
            .subjects
            .iter()
            .find(|s| s.id == subject_id)?
            .enrollments
            .iter()
            .find(|e| &e.scope == scope)?
            .trigger
    }
}

impl ResponseSource for MemoryStore {
    fn responses(&self, subject_id: Uuid) -> Vec<ResponseRecord> {
        self.read()
            .responses
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

impl ReminderStore for MemoryStore {
    fn reminders(&self, subject_id: Uuid) -> Result<Vec<ReminderRecord>, StoreError> {
        Ok(self
            .read()
            .reminders
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn insert(&self, record: ReminderRecord) -> Result<(), StoreError> {
        Ok(self.insert_reminder(record)?)
    }
}
