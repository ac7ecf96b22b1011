mod compare;
mod config;
mod diff;
mod error;
mod group;
mod load;
mod lookup;
mod path;
mod record;
mod render;
mod schema;
mod session;
mod store;
mod summary;

pub use compare::{compare_window, Cell, Comparison, ComparisonRow};
pub use config::{GroupingSection, StoreSection, ViewerConfig, DEFAULT_CONFIG, DEFAULT_STORE_DIR};
pub use diff::{changed_leaves, diff_paths, lookups_equal, values_equal};
pub use error::{Result, ViewerError};
pub use group::{
    find_plan, group_records, ContextGroup, GroupOptions, GroupingPolicy, PlanNode,
    TransactionNode,
};
pub use load::{parse_assignments, read_assignments, read_feed, ASSIGNMENTS_KEY};
pub use lookup::{lookup, lookup_path, lookup_record, Lookup};
pub use path::{collect_paths, FieldPath, PathSegment};
pub use record::{coerce_id, FieldNames, Record, RecordIdentity, UNDEFINED_ID};
pub use render::{
    render_cell, render_comparison, render_plans, render_scalar, render_summary, render_table,
    render_transactions, render_value,
};
pub use schema::{KeyElement, KeySchema, TransactionColumns};
pub use session::{LoadOutcome, LoadTicket, Session};
pub use store::{BlobStore, FileStore, MemoryStore};
pub use summary::{summary_table, SummaryRow, SummaryTable, MISSING_CELL};
