use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use assignview_core::{
    changed_leaves, compare_window, diff_paths, find_plan, group_records, lookup,
    read_assignments, read_feed, render_cell, render_comparison, render_plans, render_summary,
    render_transactions, summary_table,
    BlobStore, Cell, FileStore, LoadOutcome, PlanNode, Record, Session, TransactionNode,
};

use crate::Runtime;

pub struct Selection<'a> {
    pub plan: &'a str,
    pub trns: &'a str,
    pub context: usize,
}

pub fn load(runtime: &Runtime, input: &Path) -> Result<()> {
    let mut session = open_session(runtime)?;
    let plans = load_into(&mut session, input)?;
    emit(runtime, &*plans, || render_plans(&plans))
}

pub fn plans(runtime: &Runtime, input: Option<&Path>) -> Result<()> {
    let plans = current_plans(runtime, input)?;
    emit(runtime, &*plans, || render_plans(&plans))
}

pub fn show(
    runtime: &Runtime,
    plan_id: &str,
    trns_id: Option<&str>,
    context: usize,
    input: Option<&Path>,
) -> Result<()> {
    let plans = current_plans(runtime, input)?;
    let plan = find_plan(&plans, plan_id).ok_or_else(|| anyhow!("plan {plan_id} not found"))?;
    let trns = match trns_id {
        Some(id) => select_transaction(plan, id)?,
        None => plan
            .transactions
            .first()
            .ok_or_else(|| anyhow!("plan {plan_id} has no transactions"))?,
    };
    let group = trns.context(context).ok_or_else(|| {
        anyhow!(
            "transaction {} has {} context groups; index {context} is out of range",
            trns.id,
            trns.contexts.len()
        )
    })?;
    let table = trns
        .transaction_type
        .as_deref()
        .and_then(|code| runtime.schema.columns_for(code))
        .map(|columns| summary_table(group, columns))
        .filter(|table| !table.is_empty());

    if runtime.json {
        #[derive(Serialize)]
        struct ShowOutput<'a> {
            plan: &'a str,
            transaction: &'a str,
            context: &'a str,
            summary: Option<&'a assignview_core::SummaryTable>,
        }
        return print_json(&ShowOutput {
            plan: &plan.id,
            transaction: &trns.id,
            context: &group.name,
            summary: table.as_ref(),
        });
    }

    println!("## {} - Transactions\n", plan.name);
    print!("{}", render_transactions(plan));
    println!("\n### {} / context {} ({})\n", trns.name, context, group.name);
    match table {
        Some(table) => print!("{}", render_summary(&table)),
        None => println!("No data or configuration available for this transaction."),
    }
    Ok(())
}

pub fn compare(
    runtime: &Runtime,
    selection: Selection<'_>,
    index: usize,
    newest_first: bool,
    input: Option<&Path>,
) -> Result<()> {
    let plans = current_plans(runtime, input)?;
    let plan = find_plan(&plans, selection.plan)
        .ok_or_else(|| anyhow!("plan {} not found", selection.plan))?;
    let trns = select_transaction(plan, selection.trns)?;
    let group = trns.context(selection.context).ok_or_else(|| {
        anyhow!(
            "transaction {} has no context group {}",
            trns.id,
            selection.context
        )
    })?;
    let records: Vec<&Record> = if newest_first {
        group.records_newest_first()
    } else {
        group.records.iter().collect()
    };
    let comparison = compare_window(&records, index).ok_or_else(|| {
        anyhow!(
            "context group {} has {} records; index {index} is out of range",
            group.name,
            records.len()
        )
    })?;
    debug!(
        rows = comparison.rows.len(),
        changed = comparison.changed_rows().count(),
        "built comparison"
    );
    emit(runtime, &comparison, || render_comparison(&comparison))
}

pub fn diff(runtime: &Runtime, left: &Path, right: &Path, leaves: bool) -> Result<()> {
    let prev = read_json(left)?;
    let curr = read_json(right)?;
    let paths = if leaves {
        changed_leaves(Some(&prev), Some(&curr))
    } else {
        diff_paths(Some(&prev), Some(&curr))
    };
    if runtime.json {
        return print_json(&paths);
    }
    for path in &paths {
        let before = Cell::from(lookup(Some(&prev), path));
        let after = Cell::from(lookup(Some(&curr), path));
        println!("{path}: {} -> {}", render_cell(&before), render_cell(&after));
    }
    Ok(())
}

pub fn clear(runtime: &Runtime) -> Result<()> {
    let mut session = open_session(runtime)?;
    session.clear_cache()?;
    println!("cleared cached feed in {}", session.store().root().display());
    Ok(())
}

fn open_session(runtime: &Runtime) -> Result<Session<FileStore>> {
    let store = FileStore::open(&runtime.store_dir)
        .with_context(|| format!("failed to open store {}", runtime.store_dir.display()))?;
    Ok(Session::open(store, runtime.options.clone()))
}

fn load_into<S: BlobStore>(session: &mut Session<S>, input: &Path) -> Result<Arc<[PlanNode]>> {
    match session.load_path(input) {
        LoadOutcome::Loaded { .. } => Ok(session.plans()),
        LoadOutcome::Failed(message) => {
            Err(anyhow!("failed to load {}: {message}", input.display()))
        }
        LoadOutcome::Stale => bail!("load of {} was superseded", input.display()),
    }
}

fn current_plans(runtime: &Runtime, input: Option<&Path>) -> Result<Arc<[PlanNode]>> {
    if let Some(path) = input {
        let records = read_assignments(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let plans = group_records(&records, &runtime.options)?;
        return Ok(plans.into());
    }
    let session = open_session(runtime)?;
    if !session.has_feed() {
        bail!("no feed loaded; run `assignview load <file>` or pass --input");
    }
    Ok(session.plans())
}

fn select_transaction<'a>(plan: &'a PlanNode, id: &str) -> Result<&'a TransactionNode> {
    plan.transaction(id)
        .ok_or_else(|| anyhow!("transaction {id} not found in plan {}", plan.id))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = read_feed(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn emit<T, F>(runtime: &Runtime, value: &T, render: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce() -> String,
{
    if runtime.json {
        return print_json(value);
    }
    print!("{}", render());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
