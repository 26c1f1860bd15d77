//! Forward reachability diagnostics.

use hashbrown::HashSet;

use crate::types::NodeId;

use super::Lattice;

impl Lattice {
    /// The set of nodes reachable by following links forward from
    /// `start`, or from the lattice's start node when `start` is
    /// `None`. Uses an iterative work list; on a well-formed lattice
    /// the walk terminates because the graph is acyclic.
    pub fn reachable_nodes(&self, start: Option<NodeId>) -> HashSet<NodeId> {
        let start = start.unwrap_or(self.start_node);
        let mut result = HashSet::new();
        result.insert(start);
        let mut work = vec![start];
        while let Some(node) = work.pop() {
            for link in self.links_from(node) {
                if result.insert(link.end_node) {
                    work.push(link.end_node);
                }
            }
        }
        result
    }

    /// The complement of [`Lattice::reachable_nodes`] against all node
    /// ids: the nodes no forward walk from the start node can visit.
    pub fn unreachable_nodes(&self) -> HashSet<NodeId> {
        self.node_ids()
            .difference(&self.reachable_nodes(None))
            .copied()
            .collect()
    }
}
