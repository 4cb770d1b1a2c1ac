//! Memoized access to a normalized trace.
//!
//! A [`TraceView`] normalizes once per distinct source trace, identified by
//! `Arc` pointer rather than by value, and caches step diffs per index.
//! It is single-threaded; share by building one view per consumer.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use trunkline_ir::{StepDiff, Trace};

use crate::diff::step_diff;
use crate::normalizer::{NormalizeOptions, Normalizer};
use crate::report::TraceReport;

pub struct TraceView {
    normalizer: Normalizer,
    source: Arc<Trace>,
    normalized: Arc<Trace>,
    diffs: RefCell<HashMap<usize, Option<Arc<StepDiff>>>>,
    report: OnceCell<TraceReport>,
}

impl TraceView {
    pub fn new(source: Arc<Trace>) -> Self {
        Self::with_options(source, NormalizeOptions::default())
    }

    pub fn with_options(source: Arc<Trace>, options: NormalizeOptions) -> Self {
        let normalizer = Normalizer::with_options(options);
        let normalized = Arc::new(normalizer.normalize(&source));
        Self {
            normalizer,
            source,
            normalized,
            diffs: RefCell::new(HashMap::new()),
            report: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &Arc<Trace> {
        &self.source
    }

    pub fn normalized(&self) -> &Arc<Trace> {
        &self.normalized
    }

    /// Point the view at `source`. Returns `false`, keeping every cache, when
    /// it is the trace already shown.
    pub fn replace(&mut self, source: Arc<Trace>) -> bool {
        if Arc::ptr_eq(&self.source, &source) {
            return false;
        }
        debug!(title = %source.title, "trace replaced; renormalizing");
        self.normalized = Arc::new(self.normalizer.normalize(&source));
        self.source = source;
        self.diffs.get_mut().clear();
        self.report = OnceCell::new();
        true
    }

    /// Diff of the normalized step at `index` against its predecessor.
    pub fn diff(&self, index: usize) -> Option<Arc<StepDiff>> {
        if let Some(cached) = self.diffs.borrow().get(&index) {
            return cached.clone();
        }
        let computed = step_diff(index, &self.normalized.steps).map(Arc::new);
        self.diffs.borrow_mut().insert(index, computed.clone());
        computed
    }

    pub fn report(&self) -> &TraceReport {
        self.report
            .get_or_init(|| TraceReport::from_trace(&self.normalized))
    }

    /// Number of step indices with a cached diff.
    pub fn cached_diffs(&self) -> usize {
        self.diffs.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trunkline_ir::{ReplicaMap, ReplicaState, Step};

    fn trace(commits: &[u64]) -> Arc<Trace> {
        let steps = commits
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let mut replica = ReplicaState::new(1);
                replica.commit = c;
                replica.durable = c;
                replica.end = c;
                let mut replicas = ReplicaMap::new();
                replicas.insert("R1".into(), replica);
                Step::new(i as u64, replicas)
            })
            .collect();
        Arc::new(Trace::new("view", steps))
    }

    #[test]
    fn diffs_are_cached_per_index() {
        let view = TraceView::new(trace(&[0, 1, 2]));
        let first = view.diff(1).unwrap();
        let again = view.diff(1).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert!(view.diff(9).is_none());
        assert_eq!(view.cached_diffs(), 2);
    }

    #[test]
    fn same_trace_is_not_renormalized() {
        let source = trace(&[0, 1]);
        let mut view = TraceView::new(Arc::clone(&source));
        let normalized = Arc::clone(view.normalized());
        view.diff(1);

        assert!(!view.replace(Arc::clone(&source)));
        assert!(Arc::ptr_eq(&normalized, view.normalized()));
        assert_eq!(view.cached_diffs(), 1);
    }

    #[test]
    fn equal_but_distinct_trace_is_renormalized() {
        let mut view = TraceView::new(trace(&[0, 1]));
        view.diff(1);
        assert!(view.report().passed);

        assert!(view.replace(trace(&[0, 1, 0])));
        assert_eq!(view.cached_diffs(), 0);
        assert_eq!(view.normalized().steps.len(), 3);
        assert!(!view.report().passed);
    }
}
