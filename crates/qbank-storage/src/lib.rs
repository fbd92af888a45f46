//! qbank-storage
//!
//! In-memory data view behind the engine's ports, persisted as a JSON
//! snapshot between worker runs.

pub mod error;
pub mod memory;
pub mod snapshot;
