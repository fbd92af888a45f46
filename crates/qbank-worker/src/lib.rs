//! qbank-worker
//!
//! The periodic reminder job: reads its config, the bank catalog and the
//! data snapshot, queues newly due reminders for every subject, and writes
//! the snapshot back.

pub mod config;
pub mod job;
