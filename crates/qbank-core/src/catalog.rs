use std::collections::{BTreeSet, HashMap, HashSet};

use jiff::Timestamp;
use serde::Deserialize;

use crate::error::CoreError;
use crate::models::bank::{BankId, BankScope, Classification, QuestionnaireBank};

/// On-disk shape of the catalog.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    #[serde(default)]
    instruments: Vec<String>,
    banks: Vec<QuestionnaireBank>,
}

/// Validated, read-only registry of questionnaire banks.
///
/// Built once at startup and shared by reference. Every structural problem in
/// the bank configuration surfaces here, so the engine never meets a malformed
/// bank mid-computation.
#[derive(Debug, Clone)]
pub struct BankCatalog {
    banks: Vec<QuestionnaireBank>,
    index: HashMap<BankId, usize>,
    instruments: BTreeSet<String>,
}

impl BankCatalog {
    /// Build a catalog from a list of known instruments and bank definitions.
    ///
    /// An empty instrument list skips the known-instrument check.
    pub fn new(
        instruments: impl IntoIterator<Item = String>,
        banks: Vec<QuestionnaireBank>,
    ) -> Result<Self, CoreError> {
        let declared: BTreeSet<String> = instruments.into_iter().collect();
        let mut index = HashMap::with_capacity(banks.len());
        let mut indefinite_scopes = HashSet::new();

        for (position, bank) in banks.iter().enumerate() {
            validate_bank(bank)?;

            if !declared.is_empty()
                && let Some(unknown) = bank.instruments.iter().find(|i| !declared.contains(*i))
            {
                return Err(CoreError::UnknownInstrument {
                    bank_id: bank.id.to_string(),
                    instrument: unknown.clone(),
                });
            }

            if bank.classification == Classification::Indefinite
                && !indefinite_scopes.insert(bank.scope.clone())
            {
                return Err(invalid(bank, "more than one indefinite bank for this scope"));
            }

            if index.insert(bank.id.clone(), position).is_some() {
                return Err(CoreError::DuplicateBank(bank.id.to_string()));
            }
        }

        let instruments = if declared.is_empty() {
            banks
                .iter()
                .flat_map(|b| b.instruments.iter().cloned())
                .collect()
        } else {
            declared
        };

        Ok(Self {
            banks,
            index,
            instruments,
        })
    }

    /// Parse and validate a JSON catalog document.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let document: CatalogDocument = serde_json::from_str(text)?;
        Self::new(document.instruments, document.banks)
    }

    pub fn bank(&self, id: &BankId) -> Option<&QuestionnaireBank> {
        self.index.get(id).map(|&position| &self.banks[position])
    }

    /// All banks in declared order.
    pub fn banks(&self) -> &[QuestionnaireBank] {
        &self.banks
    }

    /// Banks attached to any of the given scopes, in declared order.
    pub fn banks_for<'a>(
        &'a self,
        scopes: &[BankScope],
    ) -> impl Iterator<Item = &'a QuestionnaireBank> {
        self.banks.iter().filter(|bank| scopes.contains(&bank.scope))
    }

    pub fn instruments(&self) -> &BTreeSet<String> {
        &self.instruments
    }

    /// Whether any bank asks for this instrument.
    pub fn knows_instrument(&self, name: &str) -> bool {
        self.banks.iter().any(|bank| bank.includes(name))
    }
}

fn invalid(bank: &QuestionnaireBank, reason: &str) -> CoreError {
    CoreError::InvalidBank {
        bank_id: bank.id.to_string(),
        reason: reason.to_string(),
    }
}

/// Structural checks on one bank.
///
/// Offset orderings are compared on a fixed anchor instant.
fn validate_bank(bank: &QuestionnaireBank) -> Result<(), CoreError> {
    let anchor = Timestamp::UNIX_EPOCH;

    if bank.instruments.is_empty() {
        return Err(invalid(bank, "no instruments"));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = bank.instruments.iter().find(|i| !seen.insert(i.as_str())) {
        return Err(invalid(bank, &format!("instrument '{duplicate}' listed twice")));
    }

    let start = bank.start.apply(anchor)?;
    match (bank.classification, bank.expired) {
        (Classification::Indefinite, None) => {}
        (_, None) => return Err(invalid(bank, "missing expired offset")),
        (_, Some(expired)) => {
            if expired.apply(anchor)? <= start {
                return Err(invalid(bank, "expired must fall after start"));
            }
        }
    }
    if let Some(overdue) = bank.overdue {
        let overdue_at = overdue.apply(anchor)?;
        if overdue_at < start {
            return Err(invalid(bank, "overdue falls before start"));
        }
        if let Some(expired) = bank.expired
            && overdue_at > expired.apply(anchor)?
        {
            return Err(invalid(bank, "overdue falls after expired"));
        }
    }

    if bank.classification != Classification::Recurring && !bank.recurrences.is_empty() {
        return Err(invalid(bank, "only recurring banks may carry recurrences"));
    }
    for pair in bank.recurrences.windows(2) {
        if pair[0].terminates_at(anchor)? > pair[1].nth_cycle_start(anchor, 0)? {
            return Err(invalid(bank, "recurrences overlap"));
        }
    }

    let mut request_ids = HashSet::new();
    for request in &bank.reminders {
        if !request_ids.insert(request.id.as_str()) {
            return Err(invalid(
                bank,
                &format!("reminder request '{}' listed twice", request.id),
            ));
        }
    }

    Ok(())
}
