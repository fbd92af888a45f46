use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

/// Per-subject exclusivity for check-then-insert sequences.
///
/// An entry lives only while some caller holds or waits on it.
#[derive(Debug, Default)]
pub struct SubjectLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SubjectLocks {
    /// Run `f` while holding the lock for `subject_id`.
    pub fn with_subject<T>(&self, subject_id: Uuid, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(subject_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(subject_id, lock);
        result
    }

    /// Subjects with a live entry.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn lock_for(&self, subject_id: Uuid) -> Arc<Mutex<()>> {
        Arc::clone(self.map().entry(subject_id).or_default())
    }

    /// Drop our handle, and the entry too when no other caller has one.
    /// Handles are only cloned under the map lock, so the count is stable here.
    fn release(&self, subject_id: Uuid, lock: Arc<Mutex<()>>) {
        let mut locks = self.map();
        drop(lock);
        if locks
            .get(&subject_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&subject_id);
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<Uuid, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
