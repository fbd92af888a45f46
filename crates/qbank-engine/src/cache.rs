use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use crate::ports::{CachedStatus, StatusCache};

/// In-process [`StatusCache`] whose entries expire after a fixed time to live.
#[derive(Debug)]
pub struct MemoryStatusCache {
    ttl: SignedDuration,
    entries: Mutex<HashMap<Uuid, (Timestamp, CachedStatus)>>,
}

impl MemoryStatusCache {
    pub fn new(ttl: SignedDuration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Entries stay for an hour.
    pub fn hourly() -> Self {
        Self::new(SignedDuration::from_hours(1))
    }
}

impl StatusCache for MemoryStatusCache {
    fn get(&self, subject_id: Uuid) -> Option<CachedStatus> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let (stored_at, status) = entries.get(&subject_id)?.clone();
        if Timestamp::now().duration_since(stored_at) >= self.ttl {
            entries.remove(&subject_id);
            return None;
        }
        Some(status)
    }

    fn put(&self, subject_id: Uuid, status: CachedStatus) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(subject_id, (Timestamp::now(), status));
    }

    fn invalidate(&self, subject_id: Uuid) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&subject_id);
    }
}
