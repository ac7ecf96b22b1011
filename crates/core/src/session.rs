use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Result, ViewerError};
use crate::group::{group_records, GroupOptions, PlanNode};
use crate::load::{parse_assignments, read_feed, ASSIGNMENTS_KEY};
use crate::record::Record;
use crate::store::BlobStore;

/// Generation number handed out by [`Session::begin_load`]. Only the most
/// recently issued ticket may publish a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { plans: usize, records: usize },
    Failed(String),
    Stale,
}

/// Viewer state: the grouped snapshot currently shown, the raw records it was
/// built from and the last load error.
pub struct Session<S: BlobStore> {
    store: S,
    options: GroupOptions,
    records: Arc<[Record]>,
    plans: Arc<[PlanNode]>,
    error: Option<String>,
    generation: u64,
    has_feed: bool,
}

impl<S: BlobStore> Session<S> {
    /// Opens a session and restores the cached feed, if any. A cached feed
    /// that no longer parses or groups is logged and ignored.
    pub fn open(store: S, options: GroupOptions) -> Self {
        let mut session = Self {
            store,
            options,
            records: Arc::from(Vec::new()),
            plans: Arc::from(Vec::new()),
            error: None,
            generation: 0,
            has_feed: false,
        };
        match session.restore() {
            Ok(Some(records)) => info!(records, "restored cached assignment feed"),
            Ok(None) => debug!("no cached assignment feed"),
            Err(err) => warn!("ignoring cached assignment feed: {err}"),
        }
        session
    }

    fn restore(&mut self) -> Result<Option<usize>> {
        let Some(bytes) = self.store.get(ASSIGNMENTS_KEY)? else {
            return Ok(None);
        };
        let text = String::from_utf8(bytes)
            .map_err(|e| ViewerError::Format(format!("cached feed is not UTF-8: {e}")))?;
        let records = parse_assignments(&text)?;
        let plans = group_records(&records, &self.options)?;
        let count = records.len();
        self.records = records.into();
        self.plans = plans.into();
        self.has_feed = true;
        Ok(Some(count))
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    /// Publishes the outcome of a read started with `ticket`. On failure the
    /// previous snapshot stays in place and the error message is recorded.
    pub fn finish_load(&mut self, ticket: LoadTicket, read: Result<String>) -> LoadOutcome {
        if ticket.0 != self.generation {
            debug!(
                ticket = ticket.0,
                current = self.generation,
                "dropping stale load"
            );
            return LoadOutcome::Stale;
        }
        match read.and_then(|text| self.publish(&text)) {
            Ok((plans, records)) => LoadOutcome::Loaded { plans, records },
            Err(err) => {
                let message = err.to_string();
                warn!("load failed: {message}");
                self.error = Some(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    pub fn load_text(&mut self, text: &str) -> LoadOutcome {
        let ticket = self.begin_load();
        self.finish_load(ticket, Ok(text.to_string()))
    }

    pub fn load_path(&mut self, path: &Path) -> LoadOutcome {
        let ticket = self.begin_load();
        self.finish_load(ticket, read_feed(path))
    }

    fn publish(&mut self, text: &str) -> Result<(usize, usize)> {
        let records = parse_assignments(text)?;
        let plans = group_records(&records, &self.options)?;
        match serde_json::to_vec(&records) {
            Ok(bytes) => {
                if let Err(err) = self.store.put(ASSIGNMENTS_KEY, &bytes) {
                    warn!("failed to cache assignment feed: {err}");
                }
            }
            Err(err) => warn!("failed to encode assignment feed: {err}"),
        }
        let counts = (plans.len(), records.len());
        self.records = records.into();
        self.plans = plans.into();
        self.error = None;
        self.has_feed = true;
        info!(plans = counts.0, records = counts.1, "loaded assignment feed");
        Ok(counts)
    }

    /// Rebuilds the snapshot from the current records with new options.
    pub fn regroup(&mut self, options: GroupOptions) -> Result<()> {
        let plans = group_records(&self.records, &options)?;
        self.options = options;
        self.plans = plans.into();
        Ok(())
    }

    /// Drops the cached feed. The in-memory snapshot is left alone.
    pub fn clear_cache(&mut self) -> Result<()> {
        self.store.remove(ASSIGNMENTS_KEY)
    }

    /// Whether a feed was restored or loaded, even one with no records.
    pub fn has_feed(&self) -> bool {
        self.has_feed
    }

    pub fn plans(&self) -> Arc<[PlanNode]> {
        Arc::clone(&self.plans)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn options(&self) -> &GroupOptions {
        &self.options
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::GroupingPolicy;
    use crate::store::MemoryStore;

    const FEED: &str = r#"{"dataAssignments": [
        {"WS-PLAN-ID": 1, "WS-PLAN-LDSC-TX": "P1", "WS-TRNS-ID": 10, "WS-CNTX-ID": "A", "v": 1},
        {"WS-PLAN-ID": "1", "WS-PLAN-LDSC-TX": "P1", "WS-TRNS-ID": "10", "WS-CNTX-ID": "B", "v": 2},
        {"WS-PLAN-ID": "1", "WS-PLAN-LDSC-TX": "P1", "WS-TRNS-ID": "10", "WS-CNTX-ID": "A", "v": 3}
    ]}"#;

    #[test]
    fn successful_load_publishes_and_caches() {
        let mut session = Session::open(MemoryStore::new(), GroupOptions::default());
        assert_eq!(
            session.load_text(FEED),
            LoadOutcome::Loaded {
                plans: 1,
                records: 3
            }
        );
        assert_eq!(session.plans()[0].transactions[0].contexts.len(), 3);
        assert!(session.store().get(ASSIGNMENTS_KEY).unwrap().is_some());

        let restored = Session::open(session.store().clone(), GroupOptions::default());
        assert_eq!(restored.records().len(), 3);
        assert_eq!(restored.plans()[0].id, "1");
    }

    #[test]
    fn failed_load_keeps_previous_snapshot() {
        let mut session = Session::open(MemoryStore::new(), GroupOptions::default());
        session.load_text(FEED);
        let outcome = session.load_text("{not json");
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(session.error().unwrap().contains("invalid assignment feed"));
        assert_eq!(session.plans().len(), 1);
        assert_eq!(session.records().len(), 3);

        session.load_text(r#"{"dataAssignments": []}"#);
        assert!(session.error().is_none());
        assert!(session.plans().is_empty());
    }

    #[test]
    fn empty_feed_counts_as_loaded() {
        let mut session = Session::open(MemoryStore::new(), GroupOptions::default());
        assert!(!session.has_feed());
        session.load_text(r#"{"dataAssignments": []}"#);
        assert!(session.has_feed());

        let restored = Session::open(session.store().clone(), GroupOptions::default());
        assert!(restored.has_feed());
        assert!(restored.plans().is_empty());
    }

    #[test]
    fn stale_tickets_are_dropped() {
        let mut session = Session::open(MemoryStore::new(), GroupOptions::default());
        let first = session.begin_load();
        let second = session.begin_load();
        assert_eq!(
            session.finish_load(second, Ok(FEED.to_string())),
            LoadOutcome::Loaded {
                plans: 1,
                records: 3
            }
        );
        assert_eq!(
            session.finish_load(first, Ok("[]".to_string())),
            LoadOutcome::Stale
        );
        assert_eq!(session.records().len(), 3);
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let mut store = MemoryStore::new();
        store.put(ASSIGNMENTS_KEY, b"{oops").unwrap();
        let session = Session::open(store, GroupOptions::default());
        assert!(session.plans().is_empty());
        assert!(session.error().is_none());
        assert!(!session.has_feed());
    }

    #[test]
    fn regroup_switches_policy() {
        let mut session = Session::open(MemoryStore::new(), GroupOptions::default());
        session.load_text(FEED);
        session
            .regroup(GroupOptions {
                policy: GroupingPolicy::MergeById,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(session.plans()[0].transactions[0].contexts.len(), 2);
    }

    #[test]
    fn strict_mode_surfaces_malformed_records() {
        let options = GroupOptions {
            strict: true,
            ..Default::default()
        };
        let mut session = Session::open(MemoryStore::new(), options);
        let outcome = session.load_text(r#"[{"WS-PLAN-ID": 1}]"#);
        match outcome {
            LoadOutcome::Failed(message) => assert!(message.contains("WS-PLAN-LDSC-TX")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
