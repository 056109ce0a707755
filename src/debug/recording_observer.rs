use super::TraceObserver;
use crate::bounding_volume::Aabb;
use crate::partitioning::{BvhLeaf, LeafKind};
use crate::query::{TraceInfo, TraceResults};
use crate::shape::DispCollTree;
use std::collections::VecDeque;

/// Number of finished traces kept by a [`RecordingObserver`].
pub const MAX_TRACE_HISTORY_LEN: usize = 50;

/// A displacement leaf visited by a trace.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DispLeafHit {
    /// Index of the leaf in its displacement collision tree.
    pub leaf_id: usize,
    /// Exact box of the two triangles of the leaf.
    pub aabb: Aabb,
}

/// A BVH leaf visited by a trace.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadphaseLeafHit {
    /// Index of the leaf in the BVH.
    pub leaf_id: u32,
    /// The leaf itself.
    pub leaf: BvhLeaf,
    /// Displacement leaves visited inside this leaf, in chronological order.
    pub disp_leaf_hits: Vec<DispLeafHit>,
}

/// Everything recorded about one trace.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRecord {
    /// The trace description.
    pub info: TraceInfo,
    /// The final results.
    pub results: TraceResults,
    /// Visited BVH leaves, in chronological order.
    pub leaf_hits: Vec<BroadphaseLeafHit>,
}

/// A call made to a [`RecordingObserver`] out of the nesting order of [`TraceObserver`].
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ObserverUsageError {
    /// A trace was started before the previous one finished.
    #[error("{0}: the previous trace was not finished")]
    TraceNotFinished(&'static str),
    /// Called outside of a trace.
    #[error("{0}: no trace was started")]
    TraceNotStarted(&'static str),
    /// Called before the previous BVH leaf finished.
    #[error("{0}: the previous broad-phase leaf was not finished")]
    LeafNotFinished(&'static str),
    /// Called outside of a BVH leaf.
    #[error("{0}: no broad-phase leaf was started")]
    LeafNotStarted(&'static str),
    /// Called before the previous displacement leaf finished.
    #[error("{0}: the previous displacement leaf was not finished")]
    DispLeafNotFinished(&'static str),
    /// Called outside of a displacement leaf.
    #[error("{0}: no displacement leaf was started")]
    DispLeafNotStarted(&'static str),
    /// Displacement leaves can only be visited inside a displacement BVH leaf.
    #[error("{0}: the current broad-phase leaf is not a displacement")]
    NotADisplacement(&'static str),
}

#[derive(Clone, Debug)]
struct UnfinishedTrace {
    info: TraceInfo,
    leaf_hits: Vec<BroadphaseLeafHit>,
    leaf: Option<BroadphaseLeafHit>,
    disp_leaf: Option<DispLeafHit>,
}

/// An observer keeping the last [`MAX_TRACE_HISTORY_LEN`] traces.
///
/// Calls out of the nesting order of [`TraceObserver`] are usage errors. The first one is kept
/// (see [`RecordingObserver::usage_error`]) and logged; the observer then ignores every call
/// until [`RecordingObserver::clear_error`].
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    history: VecDeque<TraceRecord>,
    current: Option<UnfinishedTrace>,
    error: Option<ObserverUsageError>,
}

impl RecordingObserver {
    /// An observer with an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// The finished traces, oldest first.
    pub fn history(&self) -> &VecDeque<TraceRecord> {
        &self.history
    }

    /// The first usage error, if any.
    pub fn usage_error(&self) -> Option<ObserverUsageError> {
        self.error
    }

    /// Forgets the usage error and any unfinished trace. The history is kept.
    pub fn clear_error(&mut self) {
        self.error = None;
        self.current = None;
    }

    /// Forgets everything.
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = None;
        self.error = None;
    }

    fn fail(&mut self, error: ObserverUsageError) {
        if self.error.is_none() {
            log::error!("Trace observer usage error: {}", error);
            self.error = Some(error);
        }
    }

    fn current_mut(&mut self, caller: &'static str) -> Option<&mut UnfinishedTrace> {
        if self.error.is_some() {
            return None;
        }
        if self.current.is_none() {
            self.fail(ObserverUsageError::TraceNotStarted(caller));
        }
        self.current.as_mut()
    }
}

impl TraceObserver for RecordingObserver {
    fn start_trace(&mut self, info: &TraceInfo) {
        if self.error.is_some() {
            return;
        }
        if self.current.is_some() {
            return self.fail(ObserverUsageError::TraceNotFinished("start_trace"));
        }

        self.current = Some(UnfinishedTrace {
            info: *info,
            leaf_hits: Vec::new(),
            leaf: None,
            disp_leaf: None,
        });
    }

    fn finish_trace(&mut self, results: &TraceResults) {
        const CALLER: &str = "finish_trace";
        let Some(current) = self.current_mut(CALLER) else {
            return;
        };
        if current.leaf.is_some() {
            return self.fail(ObserverUsageError::LeafNotFinished(CALLER));
        }

        if let Some(current) = self.current.take() {
            if self.history.len() == MAX_TRACE_HISTORY_LEN {
                let _ = self.history.pop_front();
            }
            self.history.push_back(TraceRecord {
                info: current.info,
                results: *results,
                leaf_hits: current.leaf_hits,
            });
        }
    }

    fn start_broadphase_leaf(&mut self, leaf_id: u32, leaf: &BvhLeaf) {
        const CALLER: &str = "start_broadphase_leaf";
        let Some(current) = self.current_mut(CALLER) else {
            return;
        };
        if current.leaf.is_some() {
            return self.fail(ObserverUsageError::LeafNotFinished(CALLER));
        }

        current.leaf = Some(BroadphaseLeafHit {
            leaf_id,
            leaf: *leaf,
            disp_leaf_hits: Vec::new(),
        });
    }

    fn finish_broadphase_leaf(&mut self) {
        const CALLER: &str = "finish_broadphase_leaf";
        let Some(current) = self.current_mut(CALLER) else {
            return;
        };
        if current.disp_leaf.is_some() {
            return self.fail(ObserverUsageError::DispLeafNotFinished(CALLER));
        }

        match current.leaf.take() {
            Some(hit) => current.leaf_hits.push(hit),
            None => self.fail(ObserverUsageError::LeafNotStarted(CALLER)),
        }
    }

    fn start_disp_leaf(&mut self, tree: &DispCollTree, leaf_id: usize) {
        const CALLER: &str = "start_disp_leaf";
        let Some(current) = self.current_mut(CALLER) else {
            return;
        };
        let error = match &current.leaf {
            None => Some(ObserverUsageError::LeafNotStarted(CALLER)),
            Some(hit) if hit.leaf.kind != LeafKind::Displacement => {
                Some(ObserverUsageError::NotADisplacement(CALLER))
            }
            Some(_) if current.disp_leaf.is_some() => {
                Some(ObserverUsageError::DispLeafNotFinished(CALLER))
            }
            Some(_) => None,
        };
        if let Some(error) = error {
            return self.fail(error);
        }

        current.disp_leaf = Some(DispLeafHit {
            leaf_id,
            aabb: tree.leaf_aabb(leaf_id),
        });
    }

    fn finish_disp_leaf(&mut self) {
        const CALLER: &str = "finish_disp_leaf";
        let Some(current) = self.current_mut(CALLER) else {
            return;
        };
        let Some(leaf) = current.leaf.as_mut() else {
            return self.fail(ObserverUsageError::LeafNotStarted(CALLER));
        };
        if leaf.leaf.kind != LeafKind::Displacement {
            return self.fail(ObserverUsageError::NotADisplacement(CALLER));
        }

        match current.disp_leaf.take() {
            Some(hit) => leaf.disp_leaf_hits.push(hit),
            None => self.fail(ObserverUsageError::DispLeafNotStarted(CALLER)),
        }
    }
}
