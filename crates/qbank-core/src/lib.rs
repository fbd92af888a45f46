//! qbank-core
//!
//! Pure domain types for questionnaire-bank scheduling: calendar offsets,
//! recurrence rules, bank definitions, response and reminder records, and the
//! validated bank catalog. No I/O.

pub mod catalog;
pub mod error;
pub mod models;
pub mod offset;
pub mod recurrence;
