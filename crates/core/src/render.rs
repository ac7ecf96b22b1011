use itertools::Itertools;
use serde_json::Value;

use crate::compare::{Cell, Comparison};
use crate::group::PlanNode;
use crate::summary::{SummaryTable, MISSING_CELL};

const NO_DATA: &str = "No Data";
const CHANGED_MARK: &str = " *";

/// Display text for a present value. `null` renders as `No Data` and
/// composites as compact inline JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => NO_DATA.to_string(),
        other => render_scalar(other),
    }
}

pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(num) => num.to_string(),
        Value::String(s) => s.trim().to_string(),
        composite => composite.to_string(),
    }
}

pub fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Missing => MISSING_CELL.to_string(),
        Cell::Value(value) => render_value(value),
    }
}

pub fn render_comparison(comparison: &Comparison) -> String {
    let headers = ["Key", "Previous", "Current", "Next"].map(String::from);
    let rows: Vec<Vec<String>> = comparison
        .rows
        .iter()
        .map(|row| {
            let mut current = render_cell(&row.current);
            if row.changed {
                current.push_str(CHANGED_MARK);
            }
            vec![
                row.path.clone(),
                render_cell(&row.previous),
                current,
                render_cell(&row.next),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

pub fn render_summary(table: &SummaryTable) -> String {
    let headers: Vec<String> = std::iter::once("#".to_string())
        .chain(table.headers.iter().cloned())
        .collect();
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            let marker = if row.latest { "*" } else { "" };
            std::iter::once(format!("{}{}", row.position + 1, marker))
                .chain(row.cells.iter().cloned())
                .collect()
        })
        .collect();
    render_table(&headers, &rows)
}

pub fn render_plans(plans: &[PlanNode]) -> String {
    let headers = ["Plan", "Name", "Transactions", "Records"].map(String::from);
    let rows: Vec<Vec<String>> = plans
        .iter()
        .map(|plan| {
            vec![
                plan.id.clone(),
                plan.name.clone(),
                plan.transactions.len().to_string(),
                plan.record_count().to_string(),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

pub fn render_transactions(plan: &PlanNode) -> String {
    let headers = ["Transaction", "Name", "Type", "Contexts"].map(String::from);
    let rows: Vec<Vec<String>> = plan
        .transactions
        .iter()
        .map(|trns| {
            vec![
                trns.id.clone(),
                trns.name.clone(),
                trns.transaction_type
                    .clone()
                    .unwrap_or_else(|| MISSING_CELL.to_string()),
                trns.contexts
                    .iter()
                    .enumerate()
                    .map(|(idx, ctx)| format!("{idx}:{} ({})", ctx.name, ctx.records.len()))
                    .join(", "),
            ]
        })
        .collect();
    render_table(&headers, &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    write_row(headers, &mut out);
    out.push('|');
    for _ in headers {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in rows {
        write_row(row, &mut out);
    }
    out
}

fn write_row(cells: &[String], out: &mut String) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&sanitize_cell(cell));
        out.push_str(" |");
    }
    out.push('\n');
}

fn sanitize_cell(value: &str) -> String {
    value
        .replace('|', "\\|")
        .replace('\n', " ")
        .trim()
        .to_string()
}
