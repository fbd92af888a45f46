use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qbank_core::models::bank::BankScope;
use qbank_core::models::reminder::ReminderRecord;
use qbank_core::models::response::ResponseRecord;

use crate::error::StorageError;

/// Everything the engine reads, as persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub subjects: Vec<SubjectRecord>,
    #[serde(default)]
    pub responses: Vec<ResponseRecord>,
    #[serde(default)]
    pub reminders: Vec<ReminderRecord>,
}

/// A subject's enrollments and the trigger of each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: Uuid,
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub scope: BankScope,
    /// Unset until the anchoring event happens.
    #[serde(default)]
    pub trigger: Option<Timestamp>,
}

/// Load a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.display().to_string())
        } else {
            StorageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let snapshot: Snapshot = serde_json::from_str(&contents)?;
    tracing::debug!(
        path = %path.display(),
        subjects = snapshot.subjects.len(),
        responses = snapshot.responses.len(),
        reminders = snapshot.reminders.len(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

/// Save a snapshot file, replacing any previous one atomically.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    let io = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(io)?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = tmp_path_for(path);
    std::fs::write(&tmp_path, json.as_bytes()).map_err(io)?;
    std::fs::rename(&tmp_path, path).map_err(io)?;

    tracing::info!(path = %path.display(), "snapshot saved");
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
