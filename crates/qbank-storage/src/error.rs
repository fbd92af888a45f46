use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use qbank_core::models::bank::BankId;
use qbank_engine::error::StoreError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("reminder already exists for subject {subject_id}, bank {bank_id}, iteration {iteration}")]
    Duplicate {
        subject_id: Uuid,
        bank_id: BankId,
        iteration: u32,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Duplicate {
                subject_id,
                bank_id,
                iteration,
            } => StoreError::Duplicate {
                subject_id,
                bank_id,
                iteration,
            },
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}
