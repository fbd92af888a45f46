use std::sync::Arc;

use eyre::WrapErr;
use jiff::Timestamp;

use qbank_core::catalog::BankCatalog;
use qbank_core::models::reminder::ReminderState;
use qbank_engine::cache::MemoryStatusCache;
use qbank_engine::{AssessmentEngine, EnginePorts};
use qbank_storage::error::StorageError;
use qbank_storage::memory::MemoryStore;
use qbank_storage::snapshot::{self, Snapshot};

use crate::config::WorkerConfig;

/// Counts from one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub subjects: usize,
    /// Reminders queued, suspended ones included.
    pub queued: usize,
    pub suspended: usize,
    /// Subject and bank pairs whose evaluation failed.
    pub failures: usize,
}

pub fn load_catalog(config: &WorkerConfig) -> eyre::Result<BankCatalog> {
    let path = &config.catalog_path;
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read catalog at {}", path.display()))?;
    let catalog = BankCatalog::from_json(&text)
        .wrap_err_with(|| format!("invalid catalog at {}", path.display()))?;
    tracing::info!(path = %path.display(), banks = catalog.banks().len(), "catalog loaded");
    Ok(catalog)
}

/// A missing snapshot starts the run from empty.
fn load_store(config: &WorkerConfig) -> eyre::Result<MemoryStore> {
    match snapshot::load_snapshot(&config.snapshot_path) {
        Ok(snapshot) => Ok(MemoryStore::from_snapshot(snapshot)),
        Err(StorageError::NotFound(path)) => {
            tracing::info!(%path, "no snapshot found, starting empty");
            Ok(MemoryStore::from_snapshot(Snapshot::default()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Evaluate reminders for every subject against every bank that has reminder
/// requests, then persist the result.
///
/// A failing subject is logged and counted; it does not stop the run.
pub fn run(config: &WorkerConfig, now: Timestamp) -> eyre::Result<RunSummary> {
    let catalog = Arc::new(load_catalog(config)?);
    let store = Arc::new(load_store(config)?);

    let ports = EnginePorts {
        directory: store.clone(),
        responses: store.clone(),
        reminders: store.clone(),
        cache: Arc::new(MemoryStatusCache::new(config.cache_ttl())),
    };
    let engine = AssessmentEngine::new(catalog.clone(), ports, config.engine_settings());

    let subjects = store.subjects();
    let mut summary = RunSummary {
        subjects: subjects.len(),
        ..RunSummary::default()
    };

    for subject_id in subjects {
        for bank in catalog.banks().iter().filter(|b| !b.reminders.is_empty()) {
            match engine.evaluate_reminders(subject_id, &bank.id, now) {
                Ok(queued) => {
                    summary.queued += queued.len();
                    summary.suspended += queued
                        .iter()
                        .filter(|r| r.state == ReminderState::Suspended)
                        .count();
                }
                Err(e) => {
                    tracing::warn!(%subject_id, bank = %bank.id, error = %e, "reminder evaluation failed");
                    summary.failures += 1;
                }
            }
        }
    }

    snapshot::save_snapshot(&config.snapshot_path, &store.snapshot())?;
    Ok(summary)
}
