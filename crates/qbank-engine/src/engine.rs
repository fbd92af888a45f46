use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use qbank_core::catalog::BankCatalog;
use qbank_core::models::bank::{BankId, Classification, QuestionnaireBank};
use qbank_core::models::reminder::ReminderRecord;
use qbank_core::models::response::ResponseRecord;
use qbank_core::models::status::{
    AssessmentReport, AttentionList, ClassificationFilter, InstrumentState, InstrumentStatus,
    OverallStatus,
};

use crate::aggregate;
use crate::classify::classify;
use crate::error::{EngineError, ScheduleError, StoreError};
use crate::locks::SubjectLocks;
use crate::ports::{CachedStatus, ReminderStore, ResponseSource, StatusCache, SubjectDirectory};
use crate::reminders;
use crate::resolver::{self, DEFAULT_SCAN_LIMIT, RecentStatuses};
use crate::schedule::{self, ActiveWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Propagate internal invariant violations instead of degrading the
    /// affected instrument to Expired. Meant for non-production use.
    pub strict_invariants: bool,
    /// Most recent responses considered per instrument.
    pub response_scan_limit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strict_invariants: false,
            response_scan_limit: DEFAULT_SCAN_LIMIT,
        }
    }
}

/// The collaborators an engine reads from.
#[derive(Clone)]
pub struct EnginePorts {
    pub directory: Arc<dyn SubjectDirectory>,
    pub responses: Arc<dyn ResponseSource>,
    pub reminders: Arc<dyn ReminderStore>,
    pub cache: Arc<dyn StatusCache>,
}

/// Entry point for status reporting, attention listings and the reminder job.
pub struct AssessmentEngine {
    catalog: Arc<BankCatalog>,
    ports: EnginePorts,
    locks: SubjectLocks,
    settings: EngineSettings,
}

impl AssessmentEngine {
    pub fn new(catalog: Arc<BankCatalog>, ports: EnginePorts, settings: EngineSettings) -> Self {
        Self {
            catalog,
            ports,
            locks: SubjectLocks::default(),
            settings,
        }
    }

    pub fn catalog(&self) -> &BankCatalog {
        &self.catalog
    }

    /// Overall status of the subject's most current bank, served from the
    /// cache when possible.
    ///
    /// Never fails: subjects without a resolvable window, and any evaluation
    /// error, report Expired.
    pub fn compute_overall_status(&self, subject_id: Uuid, now: Timestamp) -> OverallStatus {
        if let Some(cached) = self.ports.cache.get(subject_id) {
            debug!(%subject_id, overall = %cached.overall, "status cache hit");
            return cached.overall;
        }
        debug!(%subject_id, "status cache miss");

        match self.assessment_report(subject_id, now) {
            Ok(report) => {
                self.ports.cache.put(
                    subject_id,
                    CachedStatus {
                        overall: report.overall,
                        bank_id: report.bank_id,
                        iteration: report.iteration,
                    },
                );
                report.overall
            }
            Err(err) => {
                error!(%subject_id, error = %err, "status evaluation failed; reporting expired");
                OverallStatus::Expired
            }
        }
    }

    /// Full, uncached status detail for the subject's most current bank.
    ///
    /// Only fails in strict mode, on an invariant violation.
    pub fn assessment_report(
        &self,
        subject_id: Uuid,
        now: Timestamp,
    ) -> Result<AssessmentReport, ScheduleError> {
        let responses = self.ports.responses.responses(subject_id);
        let Some((bank, window)) = self.current_window(subject_id, now) else {
            debug!(%subject_id, "no active questionnaire bank");
            return Ok(AssessmentReport {
                subject_id,
                bank_id: None,
                iteration: None,
                instruments: Vec::new(),
                overall: aggregate::aggregate_or_expired(None),
                completed_date: None,
                next_due_date: None,
            });
        };

        let statuses = self.bank_statuses(subject_id, bank, &window, &responses, now)?;
        Ok(AssessmentReport {
            subject_id,
            bank_id: Some(bank.id.clone()),
            iteration: Some(window.iteration),
            overall: aggregate::aggregate_or_expired(Some(&statuses)),
            completed_date: aggregate::completed_date(&statuses),
            next_due_date: aggregate::next_due_date(&statuses),
            instruments: statuses,
        })
    }

    /// Instruments the subject should be pointed at.
    ///
    /// Needing full assessment: not started, not completed, window still open.
    /// In progress: started, and a deadline remains so it can be resumed.
    pub fn instruments_needing_attention(
        &self,
        subject_id: Uuid,
        filter: ClassificationFilter,
        now: Timestamp,
    ) -> AttentionList {
        let statuses = match self.statuses_for(subject_id, filter, now) {
            Ok(statuses) => statuses,
            Err(err) => {
                error!(%subject_id, error = %err, "status evaluation failed; nothing listed");
                return AttentionList::default();
            }
        };

        let mut attention = AttentionList::default();
        for status in statuses {
            if status.in_progress.is_some() {
                if status.by_date.is_some() {
                    attention.in_progress.push(status.instrument);
                }
            } else if !matches!(
                status.state,
                InstrumentState::Completed | InstrumentState::Expired
            ) {
                attention.needing_full_assessment.push(status.instrument);
            }
        }
        attention
    }

    /// Queue the reminders of `bank_id` that have come due for the subject.
    ///
    /// Runs under the subject's lock, and every returned reminder has been
    /// inserted into the reminder store. Dispatching them is up to the caller.
    pub fn evaluate_reminders(
        &self,
        subject_id: Uuid,
        bank_id: &BankId,
        now: Timestamp,
    ) -> Result<Vec<ReminderRecord>, EngineError> {
        let bank = self
            .catalog
            .bank(bank_id)
            .ok_or_else(|| EngineError::UnknownBank(bank_id.clone()))?;
        debug!(%subject_id, bank = %bank.id, "evaluating reminders");

        if bank.reminders.is_empty() {
            debug!(bank = %bank.id, "no reminder requests configured");
            return Ok(Vec::new());
        }
        if !self.ports.directory.scopes(subject_id).contains(&bank.scope) {
            debug!(%subject_id, bank = %bank.id, "subject not enrolled in bank scope");
            return Ok(Vec::new());
        }
        let Some(trigger) = self.trigger_for(subject_id, bank) else {
            debug!(%subject_id, bank = %bank.id, "no trigger date; nothing to schedule");
            return Ok(Vec::new());
        };
        let window = match schedule::active_iteration(bank, trigger, now) {
            Ok(window) => window,
            Err(err @ (ScheduleError::NotYetStarted { .. } | ScheduleError::NotApplicable { .. })) => {
                debug!(%subject_id, bank = %bank.id, error = %err, "no active iteration");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        // Outstanding work is judged on this bank's window alone.
        let responses = self.ports.responses.responses(subject_id);
        let statuses = self.bank_statuses(subject_id, bank, &window, &responses, now)?;
        let overall = aggregate::aggregate(&statuses);
        debug!(%subject_id, bank = %bank.id, iteration = window.iteration, %overall, "window status");

        let queued = self.locks.with_subject(subject_id, || {
            self.queue_due(subject_id, bank, &window, overall, now)
        })?;

        if !queued.is_empty() {
            info!(
                %subject_id,
                bank = %bank.id,
                iteration = window.iteration,
                count = queued.len(),
                "queued reminders"
            );
        }
        Ok(queued)
    }

    /// Check-then-insert of the owed reminders. Callers hold the subject lock.
    fn queue_due(
        &self,
        subject_id: Uuid,
        bank: &QuestionnaireBank,
        window: &ActiveWindow,
        overall: OverallStatus,
        now: Timestamp,
    ) -> Result<Vec<ReminderRecord>, EngineError> {
        let existing = self.ports.reminders.reminders(subject_id)?;
        let due = reminders::due_reminders(subject_id, bank, window, overall, &existing, now)?;

        let mut queued = Vec::with_capacity(due.len());
        for record in due {
            match self.ports.reminders.insert(record.clone()) {
                Ok(()) => queued.push(record),
                Err(err @ StoreError::Duplicate { .. }) => {
                    warn!(%subject_id, error = %err, "reminder claimed elsewhere; skipping");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(queued)
    }

    /// Latest authored time per response status for one instrument.
    ///
    /// Instruments no bank asks for are logged and treated as unanswered.
    pub fn recent_statuses(&self, subject_id: Uuid, instrument: &str) -> RecentStatuses {
        if !self.catalog.knows_instrument(instrument) {
            warn!(%subject_id, instrument, "unknown instrument; treating as unanswered");
            return RecentStatuses::new();
        }
        let responses = self.ports.responses.responses(subject_id);
        resolver::recent_statuses(
            &responses,
            subject_id,
            instrument,
            self.settings.response_scan_limit,
        )
    }

    /// Whether the subject has a started bank of this classification.
    pub fn enrolled_in(&self, subject_id: Uuid, classification: Classification) -> bool {
        let scopes = self.ports.directory.scopes(subject_id);
        self.catalog
            .banks_for(&scopes)
            .filter(|bank| bank.classification == classification)
            .any(|bank| self.trigger_for(subject_id, bank).is_some())
    }

    /// Drop the cached status for a subject. Call after recording responses.
    pub fn invalidate(&self, subject_id: Uuid) {
        debug!(%subject_id, "invalidating cached status");
        self.ports.cache.invalidate(subject_id);
    }

    fn trigger_for(&self, subject_id: Uuid, bank: &QuestionnaireBank) -> Option<Timestamp> {
        self.ports.directory.trigger(subject_id, &bank.scope)
    }

    fn current_window(
        &self,
        subject_id: Uuid,
        now: Timestamp,
    ) -> Option<(&QuestionnaireBank, ActiveWindow)> {
        let scopes = self.ports.directory.scopes(subject_id);
        schedule::current_window(
            self.catalog.banks_for(&scopes),
            |bank| self.trigger_for(subject_id, bank),
            now,
        )
    }

    fn indefinite_window(
        &self,
        subject_id: Uuid,
        now: Timestamp,
    ) -> Option<(&QuestionnaireBank, ActiveWindow)> {
        let scopes = self.ports.directory.scopes(subject_id);
        schedule::indefinite_window(
            self.catalog.banks_for(&scopes),
            |bank| self.trigger_for(subject_id, bank),
            now,
        )
    }

    fn statuses_for(
        &self,
        subject_id: Uuid,
        filter: ClassificationFilter,
        now: Timestamp,
    ) -> Result<Vec<InstrumentStatus>, ScheduleError> {
        let responses = self.ports.responses.responses(subject_id);
        let mut statuses: Vec<InstrumentStatus> = Vec::new();

        if matches!(filter, ClassificationFilter::Current | ClassificationFilter::All)
            && let Some((bank, window)) = self.current_window(subject_id, now)
        {
            statuses = self.bank_statuses(subject_id, bank, &window, &responses, now)?;
        }

        if matches!(filter, ClassificationFilter::Indefinite | ClassificationFilter::All)
            && let Some((bank, window)) = self.indefinite_window(subject_id, now)
        {
            for status in self.bank_statuses(subject_id, bank, &window, &responses, now)? {
                match statuses.iter_mut().find(|s| s.instrument == status.instrument) {
                    Some(existing) => *existing = status,
                    None => statuses.push(status),
                }
            }
        }

        Ok(statuses)
    }

    fn bank_statuses(
        &self,
        subject_id: Uuid,
        bank: &QuestionnaireBank,
        window: &ActiveWindow,
        responses: &[ResponseRecord],
        now: Timestamp,
    ) -> Result<Vec<InstrumentStatus>, ScheduleError> {
        bank.instruments
            .iter()
            .map(|instrument| {
                let recents = resolver::recent_statuses(
                    responses,
                    subject_id,
                    instrument,
                    self.settings.response_scan_limit,
                );
                self.classify_or_degrade(subject_id, instrument, &recents, window, now)
            })
            .collect()
    }

    fn classify_or_degrade(
        &self,
        subject_id: Uuid,
        instrument: &str,
        recents: &RecentStatuses,
        window: &ActiveWindow,
        now: Timestamp,
    ) -> Result<InstrumentStatus, ScheduleError> {
        match classify(instrument, recents, window, now) {
            Err(err @ ScheduleError::PrematureStatus { .. }) if !self.settings.strict_invariants => {
                error!(%subject_id, instrument, error = %err, "premature status request; reporting expired");
                Ok(InstrumentStatus {
                    instrument: instrument.to_string(),
                    state: InstrumentState::Expired,
                    completed: None,
                    by_date: None,
                    in_progress: None,
                })
            }
            result => result,
        }
    }
}
