use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::record::{FieldNames, Record, RecordIdentity};

/// How records of one transaction are bucketed into context-groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingPolicy {
    /// Start a new group whenever the context id differs from the previous
    /// record of the same transaction. A repeated id later opens another
    /// group with the same name.
    #[default]
    SplitOnChange,
    /// One group per distinct context id within a transaction.
    MergeById,
}

impl GroupingPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "split" | "split-on-change" | "split_on_change" => Some(Self::SplitOnChange),
            "merge" | "merge-by-id" | "merge_by_id" => Some(Self::MergeById),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SplitOnChange => "split-on-change",
            Self::MergeById => "merge-by-id",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOptions {
    pub policy: GroupingPolicy,
    pub strict: bool,
    pub fields: FieldNames,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanNode {
    pub id: String,
    pub name: String,
    pub transactions: Vec<TransactionNode>,
}

impl PlanNode {
    pub fn transaction(&self, id: &str) -> Option<&TransactionNode> {
        self.transactions.iter().find(|trns| trns.id == id)
    }

    pub fn record_count(&self) -> usize {
        self.transactions
            .iter()
            .map(TransactionNode::record_count)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionNode {
    pub id: String,
    pub name: String,
    pub transaction_type: Option<String>,
    pub contexts: Vec<ContextGroup>,
}

impl TransactionNode {
    pub fn context(&self, index: usize) -> Option<&ContextGroup> {
        self.contexts.get(index)
    }

    pub fn record_count(&self) -> usize {
        self.contexts.iter().map(|ctx| ctx.records.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextGroup {
    pub name: String,
    pub records: Vec<Record>,
}

impl ContextGroup {
    pub fn records_newest_first(&self) -> Vec<&Record> {
        self.records.iter().rev().collect()
    }
}

pub fn find_plan<'a>(plans: &'a [PlanNode], id: &str) -> Option<&'a PlanNode> {
    plans.iter().find(|plan| plan.id == id)
}

/// Groups `records` into plans, transactions and context-groups in a single
/// pass. Plans and transactions keep first-occurrence order and records keep
/// input order inside their group.
pub fn group_records(records: &[Record], options: &GroupOptions) -> Result<Vec<PlanNode>> {
    let mut builder = TreeBuilder::new(options);
    for (index, record) in records.iter().enumerate() {
        builder.push(index, record)?;
    }
    let plans = builder.finish();
    debug!(
        records = records.len(),
        plans = plans.len(),
        policy = options.policy.as_str(),
        "grouped assignment records"
    );
    Ok(plans)
}

struct TreeBuilder<'a> {
    options: &'a GroupOptions,
    plans: IndexMap<String, PlanAcc>,
}

struct PlanAcc {
    name: String,
    transactions: IndexMap<String, TransactionAcc>,
}

struct TransactionAcc {
    name: String,
    transaction_type: Option<String>,
    contexts: Vec<ContextGroup>,
    last_context: Option<String>,
    by_context: HashMap<String, usize>,
}

impl TransactionAcc {
    fn new(identity: &RecordIdentity) -> Self {
        let name = identity
            .transaction_name
            .clone()
            .unwrap_or_else(|| format!("Transaction {}", identity.transaction_id));
        Self {
            name,
            transaction_type: identity.transaction_type.clone(),
            contexts: Vec::new(),
            last_context: None,
            by_context: HashMap::new(),
        }
    }

    fn slot_for(&mut self, context_id: &str, policy: GroupingPolicy) -> usize {
        match policy {
            GroupingPolicy::SplitOnChange => {
                if self.last_context.as_deref() != Some(context_id) || self.contexts.is_empty() {
                    self.open_group(context_id);
                    self.last_context = Some(context_id.to_string());
                }
                self.contexts.len() - 1
            }
            GroupingPolicy::MergeById => match self.by_context.get(context_id) {
                Some(&slot) => slot,
                None => {
                    let slot = self.open_group(context_id);
                    self.by_context.insert(context_id.to_string(), slot);
                    slot
                }
            },
        }
    }

    fn open_group(&mut self, context_id: &str) -> usize {
        self.contexts.push(ContextGroup {
            name: context_id.to_string(),
            records: Vec::new(),
        });
        self.contexts.len() - 1
    }
}

impl<'a> TreeBuilder<'a> {
    fn new(options: &'a GroupOptions) -> Self {
        Self {
            options,
            plans: IndexMap::new(),
        }
    }

    fn push(&mut self, index: usize, record: &Record) -> Result<()> {
        let identity =
            RecordIdentity::extract(record, &self.options.fields, index, self.options.strict)?;
        let plan = self
            .plans
            .entry(identity.plan_id.clone())
            .or_insert_with(|| PlanAcc {
                name: identity.plan_name.clone(),
                transactions: IndexMap::new(),
            });
        let trns = plan
            .transactions
            .entry(identity.transaction_id.clone())
            .or_insert_with(|| TransactionAcc::new(&identity));
        let slot = trns.slot_for(&identity.context_id, self.options.policy);
        trns.contexts[slot].records.push(record.clone());
        Ok(())
    }

    fn finish(self) -> Vec<PlanNode> {
        self.plans
            .into_iter()
            .map(|(id, plan)| PlanNode {
                id,
                name: plan.name,
                transactions: plan
                    .transactions
                    .into_iter()
                    .map(|(id, trns)| TransactionNode {
                        id,
                        name: trns.name,
                        transaction_type: trns.transaction_type,
                        contexts: trns.contexts,
                    })
                    .collect(),
            })
            .collect()
    }
}
