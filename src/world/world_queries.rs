use super::CollidableWorld;
use crate::bounding_volume::Aabb;
use crate::debug::{NoopObserver, TraceObserver};
use crate::math::{Point, Real};
use crate::partitioning::{BvhLeaf, LeafKind};
use crate::query::SweptTrace;
use crate::shape::{swept_trace_brush, swept_trace_func_brush, swept_trace_xprop};

/// Sweeps shorter than the square root of this are not traced.
const ZERO_DELTA_SQUARED_EPSILON: Real = 1.0e-5;

impl CollidableWorld {
    /// Sweeps `trace` through the world, improving its results.
    ///
    /// Does nothing if the world has no BVH or if the sweep has no length.
    pub fn swept_trace(&self, trace: &mut SweptTrace) {
        self.swept_trace_observed(trace, &mut NoopObserver)
    }

    /// Like [`CollidableWorld::swept_trace`], reporting progress to `observer`.
    ///
    /// The observer is not called at all without a BVH. Zero-length sweeps are reported as a
    /// trace visiting nothing.
    pub fn swept_trace_observed(&self, trace: &mut SweptTrace, observer: &mut impl TraceObserver) {
        let Some(bvh) = &self.bvh else {
            return;
        };

        observer.start_trace(&trace.info);

        // Zero-length sweeps are not overlap tests here, they simply hit nothing.
        if trace.info.delta.norm_squared() >= ZERO_DELTA_SQUARED_EPSILON {
            bvh.swept_trace(trace, observer, |trace, leaf, observer| {
                self.leaf_swept_trace(trace, leaf, observer)
            });
        }

        observer.finish_trace(&trace.results);
    }

    /// Sweeps `trace` against the object of every BVH leaf, without any pruning.
    ///
    /// Slow. Gives the same results as [`CollidableWorld::swept_trace`].
    pub fn brute_force_swept_trace(&self, trace: &mut SweptTrace) {
        let Some(bvh) = &self.bvh else {
            return;
        };
        if trace.info.delta.norm_squared() < ZERO_DELTA_SQUARED_EPSILON {
            return;
        }

        for leaf in bvh.leaves() {
            self.leaf_swept_trace(trace, leaf, &mut NoopObserver);
        }
    }

    fn leaf_swept_trace(
        &self,
        trace: &mut SweptTrace,
        leaf: &BvhLeaf,
        observer: &mut impl TraceObserver,
    ) {
        let geometry = &*self.geometry;
        let id = leaf.index;

        match leaf.kind {
            LeafKind::Brush => {
                if let Some(brush) = geometry.brushes.get(id as usize) {
                    swept_trace_brush(trace, brush, &geometry.brush_sides, &geometry.planes);
                }
            }
            LeafKind::FuncBrush => {
                if let Some(func_brush) = geometry.func_brushes.get(id as usize) {
                    swept_trace_func_brush(trace, func_brush, &geometry.brush_tables());
                }
            }
            LeafKind::Displacement => {
                // Displacements only collide with hulls.
                if trace.info.isray {
                    return;
                }
                if let Some(tree) = self.disp_trees.as_ref().and_then(|t| t.get(id as usize)) {
                    let _ = tree.sweep_aabb(trace, observer);
                }
            }
            LeafKind::StaticProp => {
                if let (Some(prop), Some(collision)) = (
                    geometry.static_props.get(id as usize),
                    self.static_prop_collision(id),
                ) {
                    swept_trace_xprop(trace, &prop.origin, &collision.model, &collision.cache);
                }
            }
            LeafKind::DynamicProp => {
                if let (Some(prop), Some(collision)) = (
                    geometry.dynamic_props.get(id as usize),
                    self.dynamic_prop_collision(id),
                ) {
                    swept_trace_xprop(trace, &prop.origin, &collision.model, &collision.cache);
                }
            }
        }
    }

    /// Does `aabb` overlap the triangles of any displacement solid to hulls?
    ///
    /// Returns `false` if the world has no BVH.
    pub fn does_aabb_intersect_any_displacement(&self, aabb: &Aabb) -> bool {
        let (Some(bvh), Some(trees)) = (&self.bvh, &self.disp_trees) else {
            return false;
        };

        bvh.intersects_any_displacement(aabb, |id| {
            trees
                .get(id as usize)
                .is_some_and(|tree| tree.intersects_aabb(aabb))
        })
    }

    /// The boxes of every BVH node and leaf containing `pt`, for debug overlays.
    pub fn aabbs_containing_point(&self, pt: &Point<Real>) -> Vec<Aabb> {
        self.bvh
            .as_ref()
            .map(|bvh| bvh.aabbs_containing_point(pt))
            .unwrap_or_default()
    }
}
