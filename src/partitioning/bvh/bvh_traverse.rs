use super::bvh_tree::{Bvh, BvhChild, BvhLeaf};
use crate::debug::TraceObserver;
use crate::math::Real;
use crate::query::SweptTrace;
use smallvec::SmallVec;

const TRAVERSAL_STACK_SIZE: usize = 32;

// A node or leaf whose box is hit by the sweep, with the fraction at which it is entered.
#[derive(Copy, Clone, Debug)]
struct TraversalCandidate {
    child: BvhChild,
    hit_fraction: Real,
}

impl Bvh {
    /// Sweeps `trace` through this BVH, calling `leaf_trace` on every leaf whose box may contain a
    /// hit earlier than the current result.
    ///
    /// The traversal is depth-first with an explicit stack. When both children of a node are hit,
    /// the nearer one is visited first. A candidate is discarded when popped if the trace already
    /// hit something before entering its box.
    ///
    /// Every leaf visit is reported to `observer`, which is also handed to `leaf_trace`.
    pub fn swept_trace<O: TraceObserver>(
        &self,
        trace: &mut SweptTrace,
        observer: &mut O,
        mut leaf_trace: impl FnMut(&mut SweptTrace, &BvhLeaf, &mut O),
    ) {
        let Some(root) = self.nodes.first() else {
            return;
        };
        let Some(root_fraction) = trace.hits_aabb_on_full_sweep(&root.aabb.mins, &root.aabb.maxs)
        else {
            return;
        };

        let mut stack: SmallVec<[TraversalCandidate; TRAVERSAL_STACK_SIZE]> = SmallVec::new();
        stack.push(TraversalCandidate {
            child: BvhChild::Node(0),
            hit_fraction: root_fraction,
        });

        while let Some(candidate) = stack.pop() {
            if trace.results.fraction < candidate.hit_fraction {
                continue;
            }

            match candidate.child {
                BvhChild::Leaf(id) => {
                    let leaf = &self.leaves[id as usize];
                    observer.start_broadphase_leaf(id, leaf);
                    leaf_trace(trace, leaf, observer);
                    observer.finish_broadphase_leaf();
                }
                BvhChild::Node(id) => {
                    let node = &self.nodes[id as usize];
                    let mut hits = node.children().map(|child| {
                        let aabb = self.child_aabb(child);
                        trace
                            .hits_aabb_on_full_sweep(&aabb.mins, &aabb.maxs)
                            .map(|hit_fraction| TraversalCandidate {
                                child,
                                hit_fraction,
                            })
                    });

                    // The nearer child goes on top of the stack.
                    if let [Some(a), Some(b)] = hits {
                        if a.hit_fraction < b.hit_fraction {
                            hits = [Some(b), Some(a)];
                        }
                    }

                    stack.extend(hits.into_iter().flatten());
                }
            }
        }
    }
}
