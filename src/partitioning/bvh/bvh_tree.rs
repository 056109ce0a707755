use crate::bounding_volume::Aabb;
use crate::math::Real;

/// Margin added around the exact box of a map object before it becomes a leaf, to account for
/// collision calculation tolerances.
pub const LEAF_AABB_BLOAT: Real = 1.0;

/// The type of map object referenced by a [`BvhLeaf`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum LeafKind {
    /// A world brush.
    Brush,
    /// A displacement collision tree.
    Displacement,
    /// A static prop.
    StaticProp,
    /// A dynamic prop.
    DynamicProp,
    /// A `func_brush` entity.
    FuncBrush,
}

impl LeafKind {
    /// Every leaf kind.
    pub const ALL: [LeafKind; 5] = [
        LeafKind::Brush,
        LeafKind::Displacement,
        LeafKind::StaticProp,
        LeafKind::DynamicProp,
        LeafKind::FuncBrush,
    ];
}

/// A set of [`LeafKind`]s.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LeafKinds(u8);

bitflags::bitflags! {
    impl LeafKinds: u8 {
        /// Contains world brushes.
        const BRUSH = 1 << 0;
        /// Contains displacements.
        const DISPLACEMENT = 1 << 1;
        /// Contains static props.
        const STATIC_PROP = 1 << 2;
        /// Contains dynamic props.
        const DYNAMIC_PROP = 1 << 3;
        /// Contains func brushes.
        const FUNC_BRUSH = 1 << 4;
    }
}

impl From<LeafKind> for LeafKinds {
    fn from(kind: LeafKind) -> Self {
        match kind {
            LeafKind::Brush => LeafKinds::BRUSH,
            LeafKind::Displacement => LeafKinds::DISPLACEMENT,
            LeafKind::StaticProp => LeafKinds::STATIC_PROP,
            LeafKind::DynamicProp => LeafKinds::DYNAMIC_PROP,
            LeafKind::FuncBrush => LeafKinds::FUNC_BRUSH,
        }
    }
}

/// A leaf of the BVH: a reference to one map object and its (bloated) box.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhLeaf {
    /// Box of the referenced object, slightly bloated.
    pub aabb: Aabb,
    /// Type of the referenced object.
    pub kind: LeafKind,
    /// Index of the referenced object in the table of its type.
    pub index: u32,
}

impl BvhLeaf {
    /// A leaf referencing the `index`-th object of the given kind.
    #[inline]
    pub fn new(kind: LeafKind, index: u32, aabb: Aabb) -> Self {
        Self { aabb, kind, index }
    }
}

/// A child of a [`BvhNode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum BvhChild {
    /// Index into [`Bvh::nodes`].
    Node(u32),
    /// Index into [`Bvh::leaves`].
    Leaf(u32),
}

static_assertions::assert_eq_size!(BvhChild, u64);

/// An internal node of the BVH. Every node has exactly two children.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BvhNode {
    /// Box enclosing both children.
    pub aabb: Aabb,
    /// The left child.
    pub left: BvhChild,
    /// The right child.
    pub right: BvhChild,
    /// The kinds of every leaf below this node.
    pub contained: LeafKinds,
}

impl BvhNode {
    /// The two children of this node.
    #[inline]
    pub fn children(&self) -> [BvhChild; 2] {
        [self.left, self.right]
    }
}

/// Indicates why a BVH could not be built.
///
/// None of these errors is fatal: a world without a BVH simply does not collide.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum BvhBuildError {
    /// A BVH needs at least two leaves.
    #[error("a BVH needs at least 2 leaves, found {0}")]
    TooFewLeaves(usize),
    /// Displacement collision trees must be built before the BVH.
    #[error("displacement collision trees were not built")]
    MissingDisplacementTrees,
    /// Prop collision caches must be built before the BVH.
    #[error("prop collision caches were not built")]
    MissingPropCaches,
}

/// A binary bounding volume hierarchy, built once with the surface area heuristic.
///
/// An empty BVH (see [`Bvh::is_empty`]) answers every query with its default result.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Bvh {
    pub(super) leaves: Vec<BvhLeaf>,
    // The root is at index 0. Children always come after their parent.
    pub(super) nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Is this BVH empty, i.e., was it never successfully built?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The leaves of this BVH, in the order they were given at construction.
    #[inline]
    pub fn leaves(&self) -> &[BvhLeaf] {
        &self.leaves
    }

    /// The internal nodes of this BVH. The root comes first.
    #[inline]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// The box enclosing every leaf, if this BVH isn't empty.
    #[inline]
    pub fn root_aabb(&self) -> Option<&Aabb> {
        self.nodes.first().map(|root| &root.aabb)
    }

    /// The box of a child of some node.
    #[inline]
    pub fn child_aabb(&self, child: BvhChild) -> &Aabb {
        match child {
            BvhChild::Node(id) => &self.nodes[id as usize].aabb,
            BvhChild::Leaf(id) => &self.leaves[id as usize].aabb,
        }
    }
}
