//! The broad-phase bounding volume hierarchy over every collidable map object.

pub use bvh_tree::{
    Bvh, BvhBuildError, BvhChild, BvhLeaf, BvhNode, LeafKind, LeafKinds, LEAF_AABB_BLOAT,
};

mod bvh_queries;
mod bvh_sah_build;
mod bvh_traverse;
mod bvh_tree;
mod bvh_validation;
