use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ViewerError};

pub type Record = Map<String, Value>;

/// Placeholder used for an absent identifier when grouping leniently.
pub const UNDEFINED_ID: &str = "undefined";

/// External names of the identifying fields of a feed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub plan_id: String,
    pub plan_name: String,
    pub transaction_id: String,
    pub transaction_name: String,
    pub transaction_type: String,
    pub context_id: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            plan_id: "WS-PLAN-ID".to_string(),
            plan_name: "WS-PLAN-LDSC-TX".to_string(),
            transaction_id: "WS-TRNS-ID".to_string(),
            transaction_name: "WS-TRNS-LDSC-TX".to_string(),
            transaction_type: "WS-TRNS-TYPE".to_string(),
            context_id: "WS-CNTX-ID".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIdentity {
    pub plan_id: String,
    pub plan_name: String,
    pub transaction_id: String,
    pub transaction_name: Option<String>,
    pub transaction_type: Option<String>,
    pub context_id: String,
}

impl RecordIdentity {
    /// Reads the identifying fields of `record`. `index` is the record's
    /// position in the feed and only feeds error reporting.
    pub fn extract(
        record: &Record,
        fields: &FieldNames,
        index: usize,
        strict: bool,
    ) -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            match record.get(name) {
                Some(value) => Ok(coerce_id(value)),
                None if strict => Err(ViewerError::MalformedRecord {
                    index,
                    field: name.to_string(),
                }),
                None => Ok(UNDEFINED_ID.to_string()),
            }
        };
        Ok(Self {
            plan_id: required(&fields.plan_id)?,
            plan_name: required(&fields.plan_name)?,
            transaction_id: required(&fields.transaction_id)?,
            transaction_name: optional(record, &fields.transaction_name),
            transaction_type: optional(record, &fields.transaction_type),
            context_id: required(&fields.context_id)?,
        })
    }
}

/// Textual form of an identifier; `1` and `"1"` coerce to the same key.
pub fn coerce_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Null => "null".to_string(),
        composite => composite.to_string(),
    }
}

fn optional(record: &Record, name: &str) -> Option<String> {
    match record.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => Some(coerce_id(value)).filter(|s| !s.is_empty()),
    }
}
