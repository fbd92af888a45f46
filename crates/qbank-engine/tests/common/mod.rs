#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jiff::Timestamp;
use uuid::Uuid;

use qbank_core::catalog::BankCatalog;
use qbank_core::models::bank::BankScope;
use qbank_core::models::reminder::ReminderRecord;
use qbank_core::models::response::{ResponseRecord, ResponseStatus};
use qbank_core::offset::RelativeOffset;
use qbank_engine::cache::MemoryStatusCache;
use qbank_engine::error::StoreError;
use qbank_engine::ports::{ReminderStore, ResponseSource, SubjectDirectory};
use qbank_engine::{AssessmentEngine, EnginePorts, EngineSettings};

pub const LOCALIZED: [&str; 3] = ["eproms_add", "epic26", "comorb"];
pub const METASTATIC_BASELINE: [&str; 6] =
    ["eortc", "eproms_add", "ironmisc", "factfpsi", "epic23", "prems"];
pub const METASTATIC_INDEFINITE: [&str; 1] = ["irondemog"];
pub const METASTATIC_3: [&str; 3] = ["eortc", "eproms_add", "ironmisc"];
pub const METASTATIC_4: [&str; 4] = ["eortc", "eproms_add", "ironmisc", "factfpsi"];

/// Banks for a localized and a metastatic organization.
pub const CATALOG: &str = r#"{
    "banks": [
        {
            "id": "localized",
            "classification": "baseline",
            "scope": {"organization": "localized"},
            "overdue": {"days": 7},
            "expired": {"months": 3},
            "instruments": ["eproms_add", "epic26", "comorb"],
            "reminders": [
                {"id": "week-1", "status": "active", "notify_post_start": {"days": 7}},
                {"id": "week-2", "status": "active", "notify_post_start": {"days": 14}},
                {"id": "month-1", "status": "active", "notify_post_start": {"months": 1}},
                {"id": "draft", "status": "draft", "notify_post_start": {"days": 1}}
            ]
        },
        {
            "id": "metastatic",
            "classification": "baseline",
            "scope": {"organization": "metastatic"},
            "overdue": {"days": 30},
            "expired": {"months": 3},
            "instruments": ["eortc", "eproms_add", "ironmisc", "factfpsi", "epic23", "prems"],
            "reminders": [
                {"id": "base-week", "status": "active", "notify_post_start": {"days": 7}}
            ]
        },
        {
            "id": "metastatic_indefinite",
            "classification": "indefinite",
            "scope": {"organization": "metastatic"},
            "expired": {"years": 50},
            "instruments": ["irondemog"]
        },
        {
            "id": "metastatic_recurring3",
            "classification": "recurring",
            "scope": {"organization": "metastatic"},
            "overdue": {"days": 30},
            "expired": {"months": 3},
            "instruments": ["eortc", "eproms_add", "ironmisc"],
            "recurrences": [
                {"start": {"months": 3}, "cycle_length": {"months": 6}, "termination": {"months": 24}}
            ]
        },
        {
            "id": "metastatic_recurring4",
            "classification": "recurring",
            "scope": {"organization": "metastatic"},
            "overdue": {"days": 30},
            "expired": {"months": 3},
            "instruments": ["eortc", "eproms_add", "ironmisc", "factfpsi"],
            "recurrences": [
                {"start": {"months": 6}, "cycle_length": {"years": 1}, "termination": {"months": 21}},
                {"start": {"months": 30}, "cycle_length": {"years": 1}, "termination": {"months": 33}}
            ],
            "reminders": [
                {"id": "first-cycle", "status": "active", "notify_post_start": {"days": 14}, "iteration": 1},
                {"id": "second-cycle", "status": "active", "notify_post_start": {"days": 14}, "iteration": 2}
            ]
        },
        {
            "id": "metastatic_recurring6",
            "classification": "recurring",
            "scope": {"organization": "metastatic"},
            "overdue": {"days": 30},
            "expired": {"months": 3},
            "instruments": ["eortc", "eproms_add", "ironmisc", "factfpsi", "epic23", "prems"],
            "recurrences": [
                {"start": {"years": 1}, "cycle_length": {"years": 1}, "termination": {"years": 3, "months": 3}}
            ]
        }
    ]
}"#;

pub fn catalog() -> BankCatalog {
    BankCatalog::from_json(CATALOG).unwrap()
}

pub fn ts(text: &str) -> Timestamp {
    text.parse().unwrap()
}

pub fn after(at: Timestamp, offset: RelativeOffset) -> Timestamp {
    offset.apply(at).unwrap()
}

pub fn days(n: i32) -> RelativeOffset {
    RelativeOffset::of_days(n)
}

pub fn months(n: i32) -> RelativeOffset {
    RelativeOffset::of_months(n)
}

pub fn trigger() -> Timestamp {
    ts("2024-01-01T09:00:00Z")
}

pub fn organization(id: &str) -> BankScope {
    BankScope::Organization(id.to_string())
}

/// In-memory stand-in for every data port.
#[derive(Default)]
pub struct TestData {
    scopes: Mutex<HashMap<Uuid, Vec<BankScope>>>,
    triggers: Mutex<HashMap<(Uuid, BankScope), Timestamp>>,
    responses: Mutex<Vec<ResponseRecord>>,
    reminders: Mutex<Vec<ReminderRecord>>,
}

impl TestData {
    pub fn enroll(&self, subject_id: Uuid, scope: BankScope, trigger: Option<Timestamp>) {
        self.scopes
            .lock()
            .unwrap()
            .entry(subject_id)
            .or_default()
            .push(scope.clone());
        if let Some(trigger) = trigger {
            self.triggers.lock().unwrap().insert((subject_id, scope), trigger);
        }
    }

    pub fn respond(&self, subject_id: Uuid, instrument: &str, status: ResponseStatus, authored: Timestamp) {
        self.responses.lock().unwrap().push(ResponseRecord {
            subject_id,
            questionnaire_reference: format!("https://example.org/api/questionnaires/{instrument}"),
            status,
            authored,
        });
    }

    pub fn stored_reminders(&self) -> Vec<ReminderRecord> {
        self.reminders.lock().unwrap().clone()
    }
}

impl SubjectDirectory for TestData {
    fn scopes(&self, subject_id: Uuid) -> Vec<BankScope> {
        self.scopes
            .lock()
            .unwrap()
            .get(&subject_id)
            .cloned()
            .unwrap_or_default()
    }

    fn trigger(&self, subject_id: Uuid, scope: &BankScope) -> Option<Timestamp> {
        self.triggers
            .lock()
            .unwrap()
            .get(&(subject_id, scope.clone()))
            .copied()
    }
}

impl ResponseSource for TestData {
    fn responses(&self, subject_id: Uuid) -> Vec<ResponseRecord> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect()
    }
}

impl ReminderStore for TestData {
    fn reminders(&self, subject_id: Uuid) -> Result<Vec<ReminderRecord>, StoreError> {
        Ok(self
            .reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect())
    }

    fn insert(&self, record: ReminderRecord) -> Result<(), StoreError> {
        let mut reminders = self.reminders.lock().unwrap();
        if reminders.iter().any(|r| r.key() == record.key()) {
            return Err(StoreError::Duplicate {
                subject_id: record.subject_id,
                bank_id: record.bank_id,
                iteration: record.iteration,
            });
        }
        reminders.push(record);
        Ok(())
    }
}

pub fn engine_with(data: Arc<TestData>, settings: EngineSettings) -> AssessmentEngine {
    let ports = EnginePorts {
        directory: data.clone(),
        responses: data.clone(),
        reminders: data,
        cache: Arc::new(MemoryStatusCache::hourly()),
    };
    AssessmentEngine::new(Arc::new(catalog()), ports, settings)
}

pub fn engine(data: Arc<TestData>) -> AssessmentEngine {
    engine_with(data, EngineSettings::default())
}
