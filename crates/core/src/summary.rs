use serde::Serialize;

use crate::group::ContextGroup;
use crate::render::render_scalar;
use crate::schema::KeyElement;

pub const MISSING_CELL: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    /// Index of the record inside its context-group, in input order.
    pub position: usize,
    pub latest: bool,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryTable {
    pub headers: Vec<String>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Key-element table for one context-group, newest record first.
pub fn summary_table(group: &ContextGroup, columns: &[KeyElement]) -> SummaryTable {
    let headers = columns.iter().map(|column| column.label.clone()).collect();
    let rows = group
        .records
        .iter()
        .enumerate()
        .rev()
        .enumerate()
        .map(|(rank, (position, record))| SummaryRow {
            position,
            latest: rank == 0,
            cells: columns
                .iter()
                .map(|column| {
                    column
                        .resolve(record)
                        .map(render_scalar)
                        .unwrap_or_else(|| MISSING_CELL.to_string())
                })
                .collect(),
        })
        .collect();
    SummaryTable { headers, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn rec(id: i64, reason: Option<&str>) -> Record {
        let mut value = json!({"WS-DATA-ASGN-ID": id});
        if let Some(reason) = reason {
            value["WS-DATA-ASGN-RSN-TX"] = json!(reason);
        }
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn rows_are_newest_first_with_missing_marker() {
        let group = ContextGroup {
            name: "A".to_string(),
            records: vec![rec(1, Some("initial")), rec(2, None)],
        };
        let columns = vec![
            KeyElement::new("WS-DATA-ASGN-ID", "ID"),
            KeyElement::new("WS-DATA-ASGN-RSN-TX", "Reason"),
        ];
        let table = summary_table(&group, &columns);
        assert_eq!(table.headers, vec!["ID", "Reason"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].position, 1);
        assert!(table.rows[0].latest);
        assert_eq!(table.rows[0].cells, vec!["2", MISSING_CELL]);
        assert_eq!(table.rows[1].position, 0);
        assert!(!table.rows[1].latest);
        assert_eq!(table.rows[1].cells, vec!["1", "initial"]);
    }
}
