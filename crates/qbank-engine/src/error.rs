use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use qbank_core::error::CoreError;
use qbank_core::models::bank::BankId;

/// No usable window for the requested instant. Recoverable: callers report
/// these subjects as Expired.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("questionnaire bank not yet started (opens {start})")]
    NotYetStarted { start: Timestamp },

    #[error("no window of the questionnaire bank applies at {now}")]
    NotApplicable { now: Timestamp },

    #[error("status requested at {now}, before the window opens at {start}")]
    PrematureStatus { start: Timestamp, now: Timestamp },

    #[error(transparent)]
    Offset(#[from] CoreError),
}

/// Failure reported by a port implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reminder already queued for subject {subject_id}, bank {bank_id}, iteration {iteration}")]
    Duplicate {
        subject_id: Uuid,
        bank_id: BankId,
        iteration: u32,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown questionnaire bank: {0}")]
    UnknownBank(BankId),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
