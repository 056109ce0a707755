use super::{DynamicProp, MapGeometry, StaticProp};
use crate::bounding_volume::BoundingVolume;
use crate::math::{Real, Vector};
use crate::partitioning::{Bvh, BvhBuildError, BvhLeaf, LeafKind, LEAF_AABB_BLOAT};
use crate::shape::{
    BrushCategory, CollisionCache, CollisionModel, CollisionModelLibrary, DispCollTree, DispFlags,
};
use hashbrown::HashMap;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Which collision data [`CollidableWorld::build`] generates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldBuildOptions {
    /// Build the collision trees of displacements.
    pub displacements: bool,
    /// Build the collision caches of static props.
    pub static_props: bool,
    /// Build the collision caches of dynamic props.
    pub dynamic_props: bool,
    /// Build prop caches on the rayon thread pool. Ignored without the `parallel` feature.
    pub parallel: bool,
}

impl Default for WorldBuildOptions {
    fn default() -> Self {
        Self {
            displacements: true,
            static_props: true,
            dynamic_props: true,
            parallel: false,
        }
    }
}

/// A placed prop ready to be traced: its shared collision model and its instance cache.
#[derive(Clone, Debug)]
pub struct PropCollision {
    /// The collision model, shared with every prop using the same model.
    pub model: Arc<CollisionModel>,
    /// Per-instance data derived from the placement.
    pub cache: CollisionCache,
}

/// The collidable state of a map: its geometry, the derived collision data and the BVH over it.
///
/// Building happens in stages. Displacement trees and prop caches must exist before the BVH can
/// be built, see [`CollidableWorld::build_bvh`]. [`CollidableWorld::build`] runs every stage.
///
/// Swept traces lazily fill the edge-plane caches of displacements, so a world must not be
/// traced from several threads at once.
#[derive(Debug)]
pub struct CollidableWorld {
    pub(super) geometry: Arc<MapGeometry>,
    pub(super) disp_trees: Option<Vec<DispCollTree>>,
    pub(super) static_prop_collisions: Option<HashMap<u32, PropCollision>>,
    pub(super) dynamic_prop_collisions: Option<HashMap<u32, PropCollision>>,
    pub(super) bvh: Option<Bvh>,
}

impl CollidableWorld {
    /// A world over `geometry` with no collision data built yet. It does not collide.
    pub fn new(geometry: Arc<MapGeometry>) -> Self {
        Self {
            geometry,
            disp_trees: None,
            static_prop_collisions: None,
            dynamic_prop_collisions: None,
            bvh: None,
        }
    }

    /// Builds a world and all its collision data.
    ///
    /// Data disabled by `options` is replaced by an empty set. A BVH build failure is logged
    /// and leaves the world without collisions.
    pub fn build(
        geometry: Arc<MapGeometry>,
        library: &CollisionModelLibrary,
        options: &WorldBuildOptions,
    ) -> Self {
        let mut world = Self::new(geometry);

        if options.displacements {
            world.build_displacement_trees();
        } else {
            world.disp_trees = Some(Vec::new());
        }

        if options.static_props {
            world.build_static_prop_caches(library, options.parallel);
        } else {
            world.static_prop_collisions = Some(HashMap::new());
        }

        if options.dynamic_props {
            world.build_dynamic_prop_caches(library, options.parallel);
        } else {
            world.dynamic_prop_collisions = Some(HashMap::new());
        }

        if let Err(err) = world.build_bvh() {
            log::warn!("World has no collisions: {}", err);
        }

        world
    }

    /// Builds the collision trees of every displacement solid to hulls.
    ///
    /// Displacements with invalid data are skipped.
    pub fn build_displacement_trees(&mut self) {
        let geometry = &*self.geometry;
        let mut trees = Vec::new();

        for (i, disp) in geometry.disp_infos.iter().enumerate() {
            if disp.has_flags(DispFlags::NO_HULL_COLL) {
                continue;
            }

            match DispCollTree::new(disp, &geometry.disp_verts) {
                Ok(tree) => trees.push(tree),
                Err(err) => log::warn!("Skipping displacement {}: {}", i, err),
            }
        }

        log::debug!("Built {} displacement collision trees", trees.len());
        self.disp_trees = Some(trees);
    }

    /// Builds the collision caches of every static prop with VPhysics solidity.
    ///
    /// Props whose model is not in `library` are not solid.
    pub fn build_static_prop_caches(&mut self, library: &CollisionModelLibrary, parallel: bool) {
        let build = |(i, prop): (usize, &StaticProp)| {
            if !prop.is_solid_with_vphysics() {
                return None;
            }
            prop_collision(
                library,
                &prop.model,
                &prop.origin,
                &prop.angles,
                prop.uniform_scale,
            )
            .map(|collision| (i as u32, collision))
        };

        let collisions = collect_prop_collisions(&self.geometry.static_props, build, parallel);
        log::debug!(
            "Built {} static prop collision caches out of {} static props",
            collisions.len(),
            self.geometry.static_props.len()
        );
        self.static_prop_collisions = Some(collisions);
    }

    /// Builds the collision caches of every dynamic prop.
    ///
    /// Props whose model is not in `library` are not solid.
    pub fn build_dynamic_prop_caches(&mut self, library: &CollisionModelLibrary, parallel: bool) {
        let build = |(i, prop): (usize, &DynamicProp)| {
            prop_collision(library, &prop.model, &prop.origin, &prop.angles, 1.0)
                .map(|collision| (i as u32, collision))
        };

        let collisions = collect_prop_collisions(&self.geometry.dynamic_props, build, parallel);
        log::debug!(
            "Built {} dynamic prop collision caches out of {} dynamic props",
            collisions.len(),
            self.geometry.dynamic_props.len()
        );
        self.dynamic_prop_collisions = Some(collisions);
    }

    /// Builds the BVH over every collidable object.
    ///
    /// Fails if displacement trees or prop caches were not built, or if there are fewer than two
    /// collidable objects. The world has no BVH after a failure.
    pub fn build_bvh(&mut self) -> Result<(), BvhBuildError> {
        self.bvh = None;
        let leaves = self.collect_leaves()?;
        let bvh = Bvh::new(leaves, |leaf| self.swept_trace_cost(leaf))?;
        self.bvh = Some(bvh);
        Ok(())
    }

    /// Estimated cost of tracing against the object of a leaf, used to build the BVH.
    pub fn swept_trace_cost(&self, leaf: &BvhLeaf) -> u64 {
        // TODO: scale with the number of brush sides and triangles of the object.
        match leaf.kind {
            LeafKind::Brush
            | LeafKind::FuncBrush
            | LeafKind::Displacement
            | LeafKind::StaticProp
            | LeafKind::DynamicProp => 1,
        }
    }

    // World brushes, func brushes, displacements, static props, dynamic props.
    fn collect_leaves(&self) -> Result<Vec<BvhLeaf>, BvhBuildError> {
        let disp_trees = self
            .disp_trees
            .as_ref()
            .ok_or(BvhBuildError::MissingDisplacementTrees)?;
        let (Some(static_props), Some(dynamic_props)) = (
            self.static_prop_collisions.as_ref(),
            self.dynamic_prop_collisions.as_ref(),
        ) else {
            return Err(BvhBuildError::MissingPropCaches);
        };

        let geometry = &*self.geometry;
        let tables = geometry.brush_tables();
        let mut leaves = Vec::new();

        for (id, brush) in tables.model_brushes(0) {
            if brush.num_sides == 0
                || !BrushCategory::COLLIDABLE
                    .iter()
                    .any(|c| brush.is_in_category(*c))
            {
                continue;
            }
            if let Some(aabb) = brush.aabb(&geometry.brush_sides, &geometry.planes) {
                leaves.push(BvhLeaf::new(
                    LeafKind::Brush,
                    id as u32,
                    aabb.loosened(LEAF_AABB_BLOAT),
                ));
            }
        }
        let num_brushes = leaves.len();

        for (id, func_brush) in geometry.func_brushes.iter().enumerate() {
            if !func_brush.is_solid() {
                continue;
            }
            if let Some(aabb) = func_brush.aabb(&tables) {
                leaves.push(BvhLeaf::new(
                    LeafKind::FuncBrush,
                    id as u32,
                    aabb.loosened(LEAF_AABB_BLOAT),
                ));
            }
        }

        // Displacement boxes are already bloated.
        for (id, tree) in disp_trees.iter().enumerate() {
            leaves.push(BvhLeaf::new(LeafKind::Displacement, id as u32, *tree.aabb()));
        }

        for (kind, num_props, collisions) in [
            (
                LeafKind::StaticProp,
                geometry.static_props.len(),
                static_props,
            ),
            (
                LeafKind::DynamicProp,
                geometry.dynamic_props.len(),
                dynamic_props,
            ),
        ] {
            for id in 0..num_props as u32 {
                if let Some(collision) = collisions.get(&id) {
                    let aabb = collision.cache.aabb();
                    if aabb.is_valid() {
                        leaves.push(BvhLeaf::new(kind, id, aabb.loosened(LEAF_AABB_BLOAT)));
                    }
                }
            }
        }

        log::debug!(
            "Collected {} BVH leaves ({} world brushes)",
            leaves.len(),
            num_brushes
        );
        Ok(leaves)
    }

    /// The geometry this world was built from.
    #[inline]
    pub fn geometry(&self) -> &Arc<MapGeometry> {
        &self.geometry
    }

    /// The BVH, if it was successfully built.
    #[inline]
    pub fn bvh(&self) -> Option<&Bvh> {
        self.bvh.as_ref()
    }

    /// The displacement collision trees, if they were built.
    ///
    /// Displacement leaves of the BVH index this slice.
    #[inline]
    pub fn displacement_trees(&self) -> Option<&[DispCollTree]> {
        self.disp_trees.as_deref()
    }

    /// The collision data of the `id`-th static prop, if it is solid.
    pub fn static_prop_collision(&self, id: u32) -> Option<&PropCollision> {
        self.static_prop_collisions.as_ref()?.get(&id)
    }

    /// The collision data of the `id`-th dynamic prop, if it is solid.
    pub fn dynamic_prop_collision(&self, id: u32) -> Option<&PropCollision> {
        self.dynamic_prop_collisions.as_ref()?.get(&id)
    }

    /// Drops the edge-plane caches of every displacement. They are rebuilt on the next trace
    /// reaching them.
    pub fn uncache_displacements(&mut self) {
        for tree in self.disp_trees.iter_mut().flatten() {
            tree.uncache();
        }
    }
}

fn prop_collision(
    library: &CollisionModelLibrary,
    model_path: &str,
    origin: &Vector<Real>,
    angles: &Vector<Real>,
    uniform_scale: Real,
) -> Option<PropCollision> {
    let Some(model) = library.get(model_path) else {
        log::debug!("No collision model for {}, the prop is not solid", model_path);
        return None;
    };

    match CollisionCache::new(model, origin, angles, uniform_scale) {
        Ok(cache) => Some(PropCollision {
            model: model.clone(),
            cache,
        }),
        Err(err) => {
            log::warn!("Skipping prop using {}: {}", model_path, err);
            None
        }
    }
}

fn collect_prop_collisions<P: Sync>(
    props: &[P],
    build: impl Fn((usize, &P)) -> Option<(u32, PropCollision)> + Sync + Send,
    parallel: bool,
) -> HashMap<u32, PropCollision> {
    #[cfg(feature = "parallel")]
    if parallel {
        let collisions: Vec<_> = props
            .par_iter()
            .enumerate()
            .filter_map(|entry| build(entry))
            .collect();
        return collisions.into_iter().collect();
    }

    #[cfg(not(feature = "parallel"))]
    if parallel {
        log::debug!("Built without the `parallel` feature, building prop caches sequentially");
    }

    props.iter().enumerate().filter_map(build).collect()
}
