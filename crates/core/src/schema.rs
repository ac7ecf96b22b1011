use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lookup::lookup_record;
use crate::record::Record;

/// One summary-table column: a field path, its header label and alternative
/// paths tried in order when the primary one does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyElement {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl KeyElement {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            fallbacks: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, key: impl Into<String>) -> Self {
        self.fallbacks.push(key.into());
        self
    }

    /// First non-null value found under the key or one of its fallbacks.
    pub fn resolve<'a>(&self, record: &'a Record) -> Option<&'a Value> {
        std::iter::once(&self.key)
            .chain(&self.fallbacks)
            .find_map(|path| {
                // Plain top-level keys may use characters the path grammar reserves.
                let found = record
                    .get(path.as_str())
                    .or_else(|| lookup_record(record, path).value());
                found.filter(|value| !value.is_null())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionColumns {
    pub trns_type: String,
    pub columns: Vec<KeyElement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySchema {
    entries: Vec<TransactionColumns>,
}

impl KeySchema {
    pub fn new(entries: Vec<TransactionColumns>) -> Self {
        Self { entries }
    }

    /// Columns shipped with the viewer for the known transaction types.
    pub fn builtin() -> Self {
        Self::new(
            ["4391", "0581"]
                .into_iter()
                .map(|trns_type| TransactionColumns {
                    trns_type: trns_type.to_string(),
                    columns: data_assignment_columns(),
                })
                .collect(),
        )
    }

    /// Adds `entries`, replacing any existing entry for the same type.
    pub fn with_overrides(mut self, entries: impl IntoIterator<Item = TransactionColumns>) -> Self {
        for entry in entries {
            match self
                .entries
                .iter_mut()
                .find(|existing| existing.trns_type == entry.trns_type)
            {
                Some(existing) => *existing = entry,
                None => self.entries.push(entry),
            }
        }
        self
    }

    pub fn columns_for(&self, trns_type: &str) -> Option<&[KeyElement]> {
        self.entries
            .iter()
            .find(|entry| entry.trns_type == trns_type)
            .map(|entry| entry.columns.as_slice())
    }

    pub fn transaction_types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.trns_type.as_str())
    }
}

fn data_assignment_columns() -> Vec<KeyElement> {
    vec![
        KeyElement::new("WS-DATA-ASGN-ID", "Data Assignment ID"),
        KeyElement::new("WS-DATA-ASGN-MDL-ID", "Data Assignment Model ID"),
        KeyElement::new("WS-DATA-ASGN-RTRN-CD", "Data Assignment Return Code"),
        KeyElement::new("WS-DATA-ASGN-RSN-TX", "Data Assignment Reason Text"),
        KeyElement::new("WS-Actl-Opt-Id", "Actual Option ID"),
        KeyElement::new("WS-CvCat[0].WP-ACTL-CV-CAT-ID", "Actual Coverage Category ID")
            .with_fallback("WS_CvCat[0].WP-ACTL-CV-CAT-ID"),
        KeyElement::new("WS-PrsnCv[0].WP-ACTL-CV-ID", "Actual Coverage ID")
            .with_fallback("WS_PrsnCv[0].WP-ACTL-CV-ID"),
        KeyElement::new("WS-ActlPr[0].WP-ACTL-PRT-PR-AT", "Actual Price At")
            .with_fallback("WS_ActlPr[0].WP-ACTL-PRT-PR-AT"),
    ]
}
