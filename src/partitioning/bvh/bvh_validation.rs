use super::bvh_tree::{Bvh, BvhChild, LeafKinds};
use crate::bounding_volume::BoundingVolume;
use hashbrown::HashSet;

impl Bvh {
    /// Panics if the tree isn’t well-formed.
    ///
    /// The tree is well-formed if every leaf is reachable exactly once from the root, every node
    /// box contains the boxes of its children, and every node knows the kinds of the leaves
    /// below it.
    pub fn assert_well_formed(&self) {
        if self.is_empty() {
            return;
        }

        let mut visited_nodes = HashSet::new();
        let mut visited_leaves = HashSet::new();
        let _ = self.assert_well_formed_recurse(0, &mut visited_nodes, &mut visited_leaves);

        assert_eq!(visited_nodes.len(), self.nodes.len(), "Unreachable nodes.");
        assert_eq!(
            visited_leaves.len(),
            self.leaves.len(),
            "Unreachable leaves."
        );
    }

    fn assert_well_formed_recurse(
        &self,
        node_id: u32,
        visited_nodes: &mut HashSet<u32>,
        visited_leaves: &mut HashSet<u32>,
    ) -> LeafKinds {
        if !visited_nodes.insert(node_id) {
            panic!("Detected loop. Node {} visited twice.", node_id);
        }

        let node = &self.nodes[node_id as usize];
        let mut contained = LeafKinds::empty();

        for child in node.children() {
            assert!(node.aabb.contains(self.child_aabb(child)));

            contained |= match child {
                BvhChild::Leaf(id) => {
                    if !visited_leaves.insert(id) {
                        panic!("Leaf {} referenced twice.", id);
                    }
                    self.leaves[id as usize].kind.into()
                }
                BvhChild::Node(id) => {
                    assert!(id > node_id, "Child node {} stored before its parent.", id);
                    self.assert_well_formed_recurse(id, visited_nodes, visited_leaves)
                }
            };
        }

        assert_eq!(node.contained, contained);
        contained
    }
}
