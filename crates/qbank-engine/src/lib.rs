//! qbank-engine
//!
//! Assessment-status computation. Resolves the questionnaire-bank iteration
//! active for a subject, classifies each instrument against that window,
//! collapses the results into one overall status, and decides which reminders
//! are owed. Pure computation over ports supplied by the caller, with no I/O.

pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod engine;
pub mod error;
pub mod locks;
pub mod ports;
pub mod reminders;
pub mod resolver;
pub mod schedule;

pub use engine::{AssessmentEngine, EnginePorts, EngineSettings};
