use super::bvh_tree::{Bvh, BvhBuildError, BvhChild, BvhLeaf, BvhNode, LeafKinds};
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::Real;

// A node whose children are still to be determined, with the range of leaf references it owns
// in each of the three sorted arrays.
struct UnsplitNode {
    node: u32,
    start: usize,
    end: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct NodeSplit {
    axis: usize,
    // References before this position go to the left child.
    pos: usize,
}

impl Bvh {
    /// Builds a BVH over the given leaves.
    ///
    /// Every node is split at the position, on any of the three axes, minimizing the surface
    /// area heuristic `cost(L) * SA(L) / SA(P) + cost(R) * SA(R) / SA(P)`, where `cost` sums
    /// `leaf_cost` over the leaves of one side. Ties keep the first split found.
    pub fn new(
        leaves: Vec<BvhLeaf>,
        leaf_cost: impl Fn(&BvhLeaf) -> u64,
    ) -> Result<Self, BvhBuildError> {
        if leaves.len() < 2 {
            return Err(BvhBuildError::TooFewLeaves(leaves.len()));
        }

        let costs: Vec<u64> = leaves.iter().map(&leaf_cost).collect();
        let mut bvh = Bvh {
            nodes: Vec::with_capacity(leaves.len() - 1),
            leaves,
        };

        // One array of leaf references per axis, sorted by centroid along that axis.
        let mut sorted: [Vec<u32>; 3] = core::array::from_fn(|axis| {
            let mut refs: Vec<u32> = (0..bvh.leaves.len() as u32).collect();
            refs.sort_by(|a, b| {
                let ca = bvh.leaves[*a as usize].aabb.center()[axis];
                let cb = bvh.leaves[*b as usize].aabb.center()[axis];
                ca.total_cmp(&cb)
            });
            refs
        });

        let root_aabb = bvh.range_aabb(&sorted[0]);
        let _ = bvh.push_node(root_aabb);
        bvh.build_hierarchy(&mut sorted, &costs);
        bvh.compute_contained_kinds();

        log::debug!(
            "BVH built: {} leaves, {} nodes",
            bvh.leaves.len(),
            bvh.nodes.len()
        );
        Ok(bvh)
    }

    fn push_node(&mut self, aabb: Aabb) -> u32 {
        let id = self.nodes.len() as u32;
        self.nodes.push(BvhNode {
            aabb,
            // Overwritten once the node is split.
            left: BvhChild::Leaf(0),
            right: BvhChild::Leaf(0),
            contained: LeafKinds::empty(),
        });
        id
    }

    fn range_aabb(&self, refs: &[u32]) -> Aabb {
        let mut aabb = Aabb::new_invalid();
        for leaf in refs {
            aabb.merge(&self.leaves[*leaf as usize].aabb);
        }
        aabb
    }

    // Splits nodes iteratively, down to the leaves.
    fn build_hierarchy(&mut self, sorted: &mut [Vec<u32>; 3], costs: &[u64]) {
        let mut is_left = vec![false; self.leaves.len()];
        let mut buffer = Vec::with_capacity(self.leaves.len());
        let mut stack = vec![UnsplitNode {
            node: 0,
            start: 0,
            end: self.leaves.len(),
        }];

        while let Some(UnsplitNode { node, start, end }) = stack.pop() {
            let count = end - start;
            debug_assert!(count >= 2);

            let split = {
                let ranges = [
                    &sorted[0][start..end],
                    &sorted[1][start..end],
                    &sorted[2][start..end],
                ];
                self.best_split(&self.nodes[node as usize].aabb, ranges, costs)
            };
            let mid = start + split.pos;

            // Stable partition of the other two axes, so both children stay sorted.
            for leaf in &sorted[split.axis][start..mid] {
                is_left[*leaf as usize] = true;
            }
            for axis in (0..3).filter(|axis| *axis != split.axis) {
                buffer.clear();
                buffer.extend_from_slice(&sorted[axis][start..end]);
                let mut l = start;
                let mut r = mid;
                for leaf in &buffer {
                    if is_left[*leaf as usize] {
                        sorted[axis][l] = *leaf;
                        l += 1;
                    } else {
                        sorted[axis][r] = *leaf;
                        r += 1;
                    }
                }
            }
            for leaf in &sorted[split.axis][start..mid] {
                is_left[*leaf as usize] = false;
            }

            let left = self.make_child(&sorted[0], start, mid, &mut stack);
            let right = self.make_child(&sorted[0], mid, end, &mut stack);
            let parent = &mut self.nodes[node as usize];
            parent.left = left;
            parent.right = right;
        }
    }

    fn make_child(
        &mut self,
        refs: &[u32],
        start: usize,
        end: usize,
        stack: &mut Vec<UnsplitNode>,
    ) -> BvhChild {
        if end - start == 1 {
            BvhChild::Leaf(refs[start])
        } else {
            let aabb = self.range_aabb(&refs[start..end]);
            let node = self.push_node(aabb);
            stack.push(UnsplitNode { node, start, end });
            BvhChild::Node(node)
        }
    }

    fn best_split(&self, parent: &Aabb, sorted: [&[u32]; 3], costs: &[u64]) -> NodeSplit {
        let count = sorted[0].len();
        let parent_area = parent.surface_area();
        let total_cost: u64 = sorted[0].iter().map(|leaf| costs[*leaf as usize]).sum();

        let mut best = NodeSplit {
            axis: 0,
            pos: count / 2,
        };
        let mut best_cost = Real::INFINITY;
        let mut right_areas = vec![0.0; count];

        for (axis, refs) in sorted.iter().enumerate() {
            // Area of the right child for every split position, from right to left.
            let mut right = Aabb::new_invalid();
            for pos in (1..count).rev() {
                right.merge(&self.leaves[refs[pos] as usize].aabb);
                right_areas[pos] = right.surface_area();
            }

            let mut left = Aabb::new_invalid();
            let mut left_cost = 0u64;
            let mut right_cost = total_cost;

            for pos in 1..count {
                let moved = refs[pos - 1] as usize;
                left.merge(&self.leaves[moved].aabb);
                left_cost += costs[moved];
                right_cost -= costs[moved];

                let cost = left_cost as Real * (left.surface_area() / parent_area)
                    + right_cost as Real * (right_areas[pos] / parent_area);
                if cost < best_cost {
                    best_cost = cost;
                    best = NodeSplit { axis, pos };
                }
            }
        }

        debug_assert!(best.pos > 0 && best.pos < count);
        best
    }

    // Children always have greater indices than their parent, so a reverse pass sees every child
    // before its parent.
    fn compute_contained_kinds(&mut self) {
        for i in (0..self.nodes.len()).rev() {
            let mut contained = LeafKinds::empty();
            for child in self.nodes[i].children() {
                contained |= match child {
                    BvhChild::Leaf(leaf) => self.leaves[leaf as usize].kind.into(),
                    BvhChild::Node(node) => {
                        debug_assert!(node as usize > i);
                        self.nodes[node as usize].contained
                    }
                };
            }
            self.nodes[i].contained = contained;
        }
    }
}
