use super::disp_plane_cache::DispCollCache;
use super::{DispError, DispFlags, DispInfo, DispVert};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real, Vector};
use crate::utils;
use arrayvec::ArrayVec;
use core::cell::OnceCell;

/// Distance epsilon of displacement collisions.
pub const DISPCOLL_DIST_EPSILON: Real = 0.03125;
/// Sentinel entry fraction of a triangle sweep that never entered any plane.
pub const DISPCOLL_INVALID_FRAC: Real = -99999.9;
/// Maximum number of quad-tree nodes of a displacement (power 4).
pub const MAX_DISP_AABB_NODES: usize = 341;
/// Capacity of the node lists built while descending a quad-tree.
pub const MAX_AABB_LIST: usize = 344;

/// Margin added around the bounds of a displacement.
const DISP_BOUNDS_BLOAT: Real = 1.0;

/// Plane type of planes that are not axial.
pub(crate) const PLANE_ANYZ: u8 = 5;

const VERT_BITS: u16 = 0x01ff;
const MIN_SHIFT: u16 = 9;
const MAX_SHIFT: u16 = 11;

/// A triangle of a displacement, with its plane and per-axis extreme vertices.
///
/// Each of the three packed words holds a 9-bit vertex index and, for one axis, the 2-bit
/// positions (0 to 2) of the vertices with the smallest and largest coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DispCollTri {
    /// The plane normal, facing the front of the displacement.
    pub normal: Vector<Real>,
    /// The plane distance.
    pub dist: Real,
    /// Bit `i` is set if `normal[i]` is negative.
    pub(crate) sign_bits: u8,
    /// The axis of the plane (0 to 2) if it is axial and faces positively, [`PLANE_ANYZ`]
    /// otherwise.
    pub(crate) plane_type: u8,
    tri_data: [u16; 3],
}

impl DispCollTri {
    fn new(v0: u16, v1: u16, v2: u16, verts: &[Point<Real>]) -> Self {
        let mut tri = Self::default();
        tri.set_vert(0, v0);
        tri.set_vert(1, v1);
        tri.set_vert(2, v2);
        tri.calc_plane(verts);
        tri.find_min_max(verts);
        tri
    }

    /// The grid index of the `i`-th vertex of this triangle.
    #[inline]
    pub fn vert(&self, i: usize) -> usize {
        (self.tri_data[i] & VERT_BITS) as usize
    }

    /// Position (0 to 2) of the vertex with the smallest coordinate along `axis`.
    #[inline]
    pub fn min(&self, axis: usize) -> usize {
        ((self.tri_data[axis] >> MIN_SHIFT) & 0b11) as usize
    }

    /// Position (0 to 2) of the vertex with the largest coordinate along `axis`.
    #[inline]
    pub fn max(&self, axis: usize) -> usize {
        ((self.tri_data[axis] >> MAX_SHIFT) & 0b11) as usize
    }

    fn set_vert(&mut self, i: usize, vert: u16) {
        debug_assert!(vert <= VERT_BITS);
        self.tri_data[i] = (self.tri_data[i] & !VERT_BITS) | (vert & VERT_BITS);
    }

    fn set_min_max(&mut self, axis: usize, min: u16, max: u16) {
        self.tri_data[axis] &= VERT_BITS;
        self.tri_data[axis] |= (min << MIN_SHIFT) | (max << MAX_SHIFT);
    }

    fn calc_plane(&mut self, verts: &[Point<Real>]) {
        let v0 = verts[self.vert(0)];
        let e0 = verts[self.vert(1)] - v0;
        let e1 = verts[self.vert(2)] - v0;

        self.normal = utils::normalized_or_zero(&e1.cross(&e0));
        self.dist = self.normal.dot(&v0.coords);

        self.sign_bits = 0;
        self.plane_type = PLANE_ANYZ;
        for axis in 0..3 {
            if self.normal[axis] < 0.0 {
                self.sign_bits |= 1 << axis;
            }
            if self.normal[axis] == 1.0 {
                self.plane_type = axis as u8;
            }
        }
    }

    fn find_min_max(&mut self, verts: &[Point<Real>]) {
        for axis in 0..3 {
            let c = [0, 1, 2].map(|i| verts[self.vert(i)][axis]);

            let (mut min, mut max) = (0, 0);
            if c[1] < c[min] {
                min = 1;
            }
            if c[2] < c[min] {
                min = 2;
            }
            if c[1] > c[max] {
                max = 1;
            }
            if c[2] > c[max] {
                max = 2;
            }

            self.set_min_max(axis, min as u16, max as u16);
        }
    }
}

/// An internal quad-tree node, storing the boxes of its four children (SW, SE, NW, NE).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DispCollNode {
    /// The boxes of the four children of this node.
    pub children: [Aabb; 4],
}

/// A quad-tree leaf: one grid cell made of two triangles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DispCollLeaf {
    /// The two triangles of this leaf.
    pub tris: [u16; 2],
}

/// The collision quad-tree of a displacement.
///
/// Internal nodes come first, followed by the leaves: the child `d` of node `n` has index
/// `4 * n + d + 1`, and an index past the internal nodes designates the leaf
/// `index - num_nodes`. Leaves are ordered by the Morton code of their grid cell.
///
/// The edge planes needed by swept box queries are computed on first use and can be dropped
/// with [`DispCollTree::uncache`]. This lazy initialization is not thread-safe: the tree is
/// `Send` but not `Sync`.
#[derive(Clone, Debug)]
pub struct DispCollTree {
    power: u32,
    flags: DispFlags,
    pub(crate) verts: Vec<Point<Real>>,
    pub(crate) tris: Vec<DispCollTri>,
    pub(crate) nodes: Vec<DispCollNode>,
    pub(crate) leaves: Vec<DispCollLeaf>,
    pub(crate) cache: OnceCell<DispCollCache>,
    aabb: Aabb,
}

impl DispCollTree {
    /// Builds the collision tree of a displacement.
    pub fn new(disp: &DispInfo, disp_verts: &[DispVert]) -> Result<Self, DispError> {
        let verts = disp.vertices(disp_verts)?;
        Ok(Self::from_vertices(
            disp.power,
            disp.flags.difference(DispFlags::UNKNOWN_2),
            verts,
        ))
    }

    /// Builds a collision tree from the displaced grid vertices, row by row.
    ///
    /// `verts` must hold exactly `(2^power + 1)^2` vertices and `power` must be in `1..=4`.
    pub(crate) fn from_vertices(power: u32, flags: DispFlags, verts: Vec<Point<Real>>) -> Self {
        debug_assert!((1..=4).contains(&power));
        debug_assert_eq!(verts.len(), ((1 << power) + 1) * ((1 << power) + 1));

        let mut result = Self {
            power,
            flags,
            verts,
            tris: Vec::new(),
            nodes: Vec::new(),
            leaves: Vec::new(),
            cache: OnceCell::new(),
            aabb: Aabb::new_invalid(),
        };

        result.create_tris();
        result.create_leaves();
        result.aabb = result.generate_boxes(0).loosened(DISP_BOUNDS_BLOAT);
        result
    }

    fn create_tris(&mut self) {
        let width = self.width();
        self.tris = Vec::with_capacity(self.tri_count());

        for tile_y in 0..width - 1 {
            for tile_x in 0..width - 1 {
                let v = (tile_y * width + tile_x) as u16;
                let w = width as u16;

                // The separating diagonal alternates between tiles.
                let tris = if (tile_x + tile_y) % 2 == 0 {
                    [[v, v + w, v + w + 1], [v, v + w + 1, v + 1]]
                } else {
                    [[v, v + w, v + 1], [v + 1, v + w, v + w + 1]]
                };

                for [a, b, c] in tris {
                    self.tris.push(DispCollTri::new(a, b, c, &self.verts));
                }
            }
        }
    }

    fn create_leaves(&mut self) {
        let cells = self.width() - 1;
        let num_leaves = cells * cells;
        let num_nodes = Self::node_count(self.power) - num_leaves;

        self.leaves = vec![DispCollLeaf::default(); num_leaves];
        self.nodes = vec![
            DispCollNode {
                children: [Aabb::new_invalid(); 4],
            };
            num_nodes
        ];

        for y in 0..cells {
            for x in 0..cells {
                let leaf = Self::index_from_components(x, y);
                let tri = ((y * cells + x) * 2) as u16;
                self.leaves[leaf].tris = [tri, tri + 1];
            }
        }
    }

    fn generate_boxes(&mut self, node: usize) -> Aabb {
        if let Some(leaf) = self.leaf_index(node) {
            return self.leaf_aabb(leaf);
        }

        let mut result = Aabb::new_invalid();
        for dir in 0..4 {
            let child_aabb = self.generate_boxes(Self::child(node, dir));
            self.nodes[node].children[dir] = child_aabb;
            result.merge(&child_aabb);
        }
        result
    }

    /// The index of the child of `node` in direction `dir` (0 to 3 for SW, SE, NW, NE).
    #[inline]
    pub fn child(node: usize, dir: usize) -> usize {
        (node << 2) + dir + 1
    }

    /// The total number of quad-tree nodes, leaves included, of a grid of the given power.
    #[inline]
    pub fn node_count(power: u32) -> usize {
        (1 << ((power + 1) << 1)) / 3
    }

    /// The leaf index of a grid cell: the bits of `x` and `y` interleaved, `x` first.
    pub fn index_from_components(mut x: usize, mut y: usize) -> usize {
        let mut index = 0;

        let mut shift = 0;
        while x != 0 {
            index |= (x & 1) << shift;
            x >>= 1;
            shift += 2;
        }

        let mut shift = 1;
        while y != 0 {
            index |= (y & 1) << shift;
            y >>= 1;
            shift += 2;
        }

        index
    }

    /// If `node` designates a leaf, returns the index of this leaf.
    #[inline]
    pub fn leaf_index(&self, node: usize) -> Option<usize> {
        node.checked_sub(self.nodes.len())
    }

    /// The grid resolution of this displacement.
    #[inline]
    pub fn power(&self) -> u32 {
        self.power
    }

    /// The collision flags of this displacement.
    #[inline]
    pub fn flags(&self) -> DispFlags {
        self.flags
    }

    /// Does this displacement have any of the given flags?
    #[inline]
    pub fn has_flags(&self, flags: DispFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Number of vertices along one side of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        (1 << self.power) + 1
    }

    /// Number of triangles.
    #[inline]
    pub fn tri_count(&self) -> usize {
        (1 << self.power) * (1 << self.power) * 2
    }

    /// The box enclosing this displacement, slightly bloated.
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// The grid vertices, row by row.
    #[inline]
    pub fn vertices(&self) -> &[Point<Real>] {
        &self.verts
    }

    /// The triangles, two per grid cell, row by row.
    #[inline]
    pub fn triangles(&self) -> &[DispCollTri] {
        &self.tris
    }

    /// The internal quad-tree nodes.
    #[inline]
    pub fn nodes(&self) -> &[DispCollNode] {
        &self.nodes
    }

    /// The quad-tree leaves.
    #[inline]
    pub fn leaves(&self) -> &[DispCollLeaf] {
        &self.leaves
    }

    /// The three vertices of a triangle.
    #[inline]
    pub fn triangle_vertices(&self, tri: &DispCollTri) -> [Point<Real>; 3] {
        [0, 1, 2].map(|i| self.verts[tri.vert(i)])
    }

    /// The exact box of the two triangles of a leaf.
    pub fn leaf_aabb(&self, leaf: usize) -> Aabb {
        let mut result = Aabb::new_invalid();
        for tri in self.leaves[leaf].tris {
            for v in self.triangle_vertices(&self.tris[tri as usize]) {
                result.take_point(v);
            }
        }
        result
    }

    /// Collects the nodes whose box is hit by a box of half-extents `extents` sweeping from
    /// `start` along `1 / inv_delta`.
    ///
    /// Nodes are visited breadth-first, so every leaf comes after every internal node. Returns
    /// the list and the position of its first leaf, which equals the list length if no leaf was
    /// reached.
    pub(crate) fn sweep_leaf_list(
        &self,
        start: &Point<Real>,
        inv_delta: &Vector<Real>,
        extents: &Vector<Real>,
    ) -> (ArrayVec<u32, MAX_AABB_LIST>, usize) {
        self.leaf_list(|node| {
            node.children
                .map(|aabb| aabb.swept_box_hit(start, inv_delta, extents).is_some())
        })
    }

    /// Collects the nodes whose box overlaps `aabb`, the same way as
    /// [`Self::sweep_leaf_list`].
    pub(crate) fn overlap_leaf_list(&self, aabb: &Aabb) -> (ArrayVec<u32, MAX_AABB_LIST>, usize) {
        self.leaf_list(|node| node.children.map(|child| child.intersects(aabb)))
    }

    fn leaf_list(
        &self,
        mut hits: impl FnMut(&DispCollNode) -> [bool; 4],
    ) -> (ArrayVec<u32, MAX_AABB_LIST>, usize) {
        let mut list = ArrayVec::new();
        list.push(0);

        let mut i = 0;
        while i < list.len() {
            let node = list[i] as usize;
            if self.leaf_index(node).is_some() {
                // The rest are all leaves.
                return (list, i);
            }
            i += 1;

            let first_child = Self::child(node, 0);
            for (dir, hit) in hits(&self.nodes[node]).into_iter().enumerate() {
                if hit {
                    list.push((first_child + dir) as u32);
                }
            }
        }

        (list, i)
    }
}
