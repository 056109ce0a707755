//! Displacements: terrain patches made of a displaced vertex grid.
//!
//! Each displacement gets a [`DispCollTree`], a quad-tree over its grid cells answering ray
//! casts, box overlap tests and swept box traces.

pub use self::disp_coll_tree::{
    DispCollLeaf, DispCollNode, DispCollTree, DispCollTri, DISPCOLL_DIST_EPSILON,
    DISPCOLL_INVALID_FRAC, MAX_AABB_LIST, MAX_DISP_AABB_NODES,
};
pub use self::disp_info::{DispError, DispFlags, DispInfo, DispVert};
pub use self::disp_plane_cache::{DispCollCache, PlaneIndexTable, NEGATED_PLANE_BIT, NORMAL_UNDEF};
pub use self::disp_queries::ray_triangle_fraction;

mod disp_coll_tree;
mod disp_info;
mod disp_plane_cache;
mod disp_queries;

#[cfg(test)]
pub(crate) use self::disp_coll_tree::test_utils;
