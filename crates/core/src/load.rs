use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ViewerError};
use crate::record::Record;

pub const ASSIGNMENTS_KEY: &str = "dataAssignments";

/// Parses feed text: either a bare array of records or an object carrying
/// them under `dataAssignments`.
pub fn parse_assignments(text: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(ASSIGNMENTS_KEY) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ViewerError::Format(format!(
                    "`{ASSIGNMENTS_KEY}` must be an array"
                )))
            }
            None => {
                return Err(ViewerError::Format(format!(
                    "expected an array or an object with `{ASSIGNMENTS_KEY}`"
                )))
            }
        },
        _ => {
            return Err(ViewerError::Format(format!(
                "expected an array or an object with `{ASSIGNMENTS_KEY}`"
            )))
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(ViewerError::Format(format!(
                "record {index} is not a JSON object"
            ))),
        })
        .collect()
}

pub fn read_feed(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ViewerError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_assignments(path: &Path) -> Result<Vec<Record>> {
    let records = parse_assignments(&read_feed(path)?)?;
    debug!(path = %path.display(), records = records.len(), "read assignment feed");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn accepts_bare_array_and_wrapped_object() {
        assert_eq!(parse_assignments(r#"[{"a": 1}]"#).unwrap().len(), 1);
        assert_eq!(
            parse_assignments(r#"{"dataAssignments": [{"a": 1}, {"b": 2}]}"#)
                .unwrap()
                .len(),
            2
        );
        assert!(parse_assignments(r#"{"dataAssignments": []}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn rejects_other_shapes() {
        for text in [
            "{not json",
            "42",
            r#"{"other": []}"#,
            r#"{"dataAssignments": {}}"#,
            r#"[1, 2]"#,
        ] {
            let err = parse_assignments(text).unwrap_err();
            assert!(err.is_format(), "{text}: {err}");
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_assignments(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ViewerError::Read { .. }));
    }

    #[test]
    fn reads_feed_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"[{{"WS-PLAN-ID": 1}}]"#).unwrap();
        let records = read_assignments(file.path()).unwrap();
        assert_eq!(records[0]["WS-PLAN-ID"], 1);
    }
}
