use crate::partitioning::BvhLeaf;
use crate::query::{TraceInfo, TraceResults};
use crate::shape::DispCollTree;

/// Receives the progress of swept traces.
///
/// Calls are nested as follows:
///
/// ```text
/// start_trace
///     start_broadphase_leaf        (any number of times)
///         start_disp_leaf          (any number of times, displacement leaves only)
///         finish_disp_leaf
///     finish_broadphase_leaf
/// finish_trace
/// ```
///
/// Every method defaults to doing nothing.
pub trait TraceObserver {
    /// A trace begins.
    fn start_trace(&mut self, _info: &TraceInfo) {}

    /// The trace is over.
    fn finish_trace(&mut self, _results: &TraceResults) {}

    /// The trace reaches the `leaf_id`-th leaf of the BVH.
    fn start_broadphase_leaf(&mut self, _leaf_id: u32, _leaf: &BvhLeaf) {}

    /// The current BVH leaf is done.
    fn finish_broadphase_leaf(&mut self) {}

    /// The trace reaches the `leaf_id`-th leaf of a displacement collision tree.
    fn start_disp_leaf(&mut self, _tree: &DispCollTree, _leaf_id: usize) {}

    /// The current displacement leaf is done.
    fn finish_disp_leaf(&mut self) {}
}

/// An observer ignoring everything.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoopObserver;

impl TraceObserver for NoopObserver {}

impl<T: TraceObserver + ?Sized> TraceObserver for &mut T {
    #[inline]
    fn start_trace(&mut self, info: &TraceInfo) {
        (**self).start_trace(info)
    }

    #[inline]
    fn finish_trace(&mut self, results: &TraceResults) {
        (**self).finish_trace(results)
    }

    #[inline]
    fn start_broadphase_leaf(&mut self, leaf_id: u32, leaf: &BvhLeaf) {
        (**self).start_broadphase_leaf(leaf_id, leaf)
    }

    #[inline]
    fn finish_broadphase_leaf(&mut self) {
        (**self).finish_broadphase_leaf()
    }

    #[inline]
    fn start_disp_leaf(&mut self, tree: &DispCollTree, leaf_id: usize) {
        (**self).start_disp_leaf(tree, leaf_id)
    }

    #[inline]
    fn finish_disp_leaf(&mut self) {
        (**self).finish_disp_leaf()
    }
}
