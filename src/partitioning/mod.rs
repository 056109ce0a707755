//! Spatial partitioning tools.

pub use self::bvh::{
    Bvh, BvhBuildError, BvhChild, BvhLeaf, BvhNode, LeafKind, LeafKinds, LEAF_AABB_BLOAT,
};

pub mod bvh;
