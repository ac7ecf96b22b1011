use std::borrow::Borrow;

use serde::Serialize;
use serde_json::Value;

use crate::diff::lookups_equal;
use crate::lookup::{lookup_path, Lookup};
use crate::path::{collect_paths, FieldPath};
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Missing,
    Value(Value),
}

impl From<Lookup<'_>> for Cell {
    fn from(found: Lookup<'_>) -> Self {
        match found {
            Lookup::Found(value) => Cell::Value(value.clone()),
            Lookup::Missing => Cell::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub path: String,
    pub label: String,
    pub previous: Cell,
    pub current: Cell,
    pub next: Cell,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub index: usize,
    pub has_previous: bool,
    pub has_next: bool,
    pub rows: Vec<ComparisonRow>,
}

impl Comparison {
    pub fn changed_rows(&self) -> impl Iterator<Item = &ComparisonRow> {
        self.rows.iter().filter(|row| row.changed)
    }
}

/// Builds the previous/current/next table around `records[index]`. A row is
/// flagged as changed when the previous value at its path differs from the
/// current one; with no previous record every present path is changed.
pub fn compare_window<R>(records: &[R], index: usize) -> Option<Comparison>
where
    R: Borrow<Record>,
{
    let current = <R as Borrow<Record>>::borrow(records.get(index)?);
    let previous = index
        .checked_sub(1)
        .and_then(|idx| records.get(idx))
        .map(<R as Borrow<Record>>::borrow);
    let next = records.get(index + 1).map(<R as Borrow<Record>>::borrow);

    let prev_value = previous.map(|rec| Value::Object(rec.clone()));
    let curr_value = Value::Object(current.clone());
    let next_value = next.map(|rec| Value::Object(rec.clone()));

    let paths = collect_paths(&[prev_value.as_ref(), Some(&curr_value), next_value.as_ref()]);
    let rows = paths
        .into_iter()
        .filter_map(|text| {
            let path = FieldPath::parse(&text)?;
            let before = lookup_path(prev_value.as_ref(), &path);
            let now = lookup_path(Some(&curr_value), &path);
            let after = lookup_path(next_value.as_ref(), &path);
            Some(ComparisonRow {
                label: path.label(),
                changed: !lookups_equal(before, now),
                previous: before.into(),
                current: now.into(),
                next: after.into(),
                path: text,
            })
        })
        .collect();
    Some(Comparison {
        index,
        has_previous: previous.is_some(),
        has_next: next.is_some(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_paths;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn window_marks_changes_against_previous() {
        let records = vec![
            rec(json!({"id": 1, "v": 1})),
            rec(json!({"id": 1, "v": 2, "extra": {"x": null}})),
            rec(json!({"id": 1, "v": 2})),
        ];
        let cmp = compare_window(&records, 1).unwrap();
        assert!(cmp.has_previous && cmp.has_next);
        let changed: Vec<_> = cmp.changed_rows().map(|row| row.path.as_str()).collect();
        assert_eq!(changed, vec!["v", "extra", "extra.x"]);
        let extra_x = cmp.rows.iter().find(|row| row.path == "extra.x").unwrap();
        assert_eq!(extra_x.label, "x");
        assert_eq!(extra_x.previous, Cell::Missing);
        assert_eq!(extra_x.current, Cell::Value(Value::Null));
        assert_eq!(extra_x.next, Cell::Missing);
    }

    #[test]
    fn first_record_flags_every_present_path() {
        let records = vec![rec(json!({"v": 1, "w": {"x": 1}})), rec(json!({"v": 2}))];
        let cmp = compare_window(&records, 0).unwrap();
        assert!(!cmp.has_previous);
        let current = Value::Object(records[0].clone());
        let changed: Vec<_> = cmp.changed_rows().map(|row| row.path.clone()).collect();
        assert_eq!(changed, diff_paths(None, Some(&current)));
        assert_eq!(changed, vec!["v", "w", "w.x"]);
        assert_eq!(cmp.rows[0].previous, Cell::Missing);
        assert_eq!(cmp.rows[0].next, Cell::Value(json!(2)));
    }

    #[test]
    fn dotted_keys_do_not_duplicate_rows() {
        let records = vec![rec(json!({"a.b": 1, "a": {"b": 2}}))];
        let cmp = compare_window(&records, 0).unwrap();
        let paths: Vec<_> = cmp.rows.iter().map(|row| row.path.as_str()).collect();
        assert_eq!(paths, vec!["a.b", "a"]);
    }

    #[test]
    fn out_of_range_index_yields_none() {
        let records: Vec<Record> = vec![rec(json!({"v": 1}))];
        assert!(compare_window(&records, 1).is_none());
        assert!(compare_window::<Record>(&[], 0).is_none());
    }

    #[test]
    fn accepts_borrowed_records() {
        let records = vec![rec(json!({"v": 1})), rec(json!({"v": 3}))];
        let newest_first: Vec<&Record> = records.iter().rev().collect();
        let cmp = compare_window(&newest_first, 1).unwrap();
        assert_eq!(cmp.rows[0].current, Cell::Value(json!(1)));
        assert!(cmp.rows[0].changed);
    }
}
