use super::bvh_tree::{Bvh, BvhChild, BvhNode, LeafKind, LeafKinds};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Point, Real};
use smallvec::SmallVec;

impl Bvh {
    /// Does `aabb` overlap any displacement?
    ///
    /// Only subtrees containing displacement leaves and overlapping `aabb` are visited. The exact
    /// test of a displacement leaf whose box overlaps `aabb` is delegated to `disp_intersects`,
    /// called with the displacement index. Returns `false` if this BVH is empty.
    pub fn intersects_any_displacement(
        &self,
        aabb: &Aabb,
        mut disp_intersects: impl FnMut(u32) -> bool,
    ) -> bool {
        if self.is_empty() {
            return false;
        }

        let mut stack: SmallVec<[u32; 32]> = SmallVec::new();
        stack.push(0);

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            for child in [node.right, node.left] {
                match child {
                    BvhChild::Node(child_id) => {
                        let child_node = &self.nodes[child_id as usize];
                        if child_node.contained.contains(LeafKinds::DISPLACEMENT)
                            && child_node.aabb.intersects(aabb)
                        {
                            stack.push(child_id);
                        }
                    }
                    BvhChild::Leaf(leaf_id) => {
                        let leaf = &self.leaves[leaf_id as usize];
                        if leaf.kind == LeafKind::Displacement
                            && leaf.aabb.intersects(aabb)
                            && disp_intersects(leaf.index)
                        {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    /// The boxes of every node and leaf containing `pt`, parents before their children.
    ///
    /// Meant for debug overlays. Returns nothing if this BVH is empty.
    pub fn aabbs_containing_point(&self, pt: &Point<Real>) -> Vec<Aabb> {
        let mut result = Vec::new();
        if let Some(root) = self.nodes.first() {
            self.aabbs_containing_point_recurse(root, pt, &mut result);
        }
        result
    }

    fn aabbs_containing_point_recurse(
        &self,
        node: &BvhNode,
        pt: &Point<Real>,
        out: &mut Vec<Aabb>,
    ) {
        if !node.aabb.contains_local_point(pt) {
            return;
        }

        out.push(node.aabb);

        for child in node.children() {
            if let BvhChild::Leaf(id) = child {
                let aabb = &self.leaves[id as usize].aabb;
                if aabb.contains_local_point(pt) {
                    out.push(*aabb);
                }
            }
        }

        for child in node.children() {
            if let BvhChild::Node(id) = child {
                self.aabbs_containing_point_recurse(&self.nodes[id as usize], pt, out);
            }
        }
    }
}
