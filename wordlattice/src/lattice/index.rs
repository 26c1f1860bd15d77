//! Sorted adjacency index over the lattice's link vector.

use std::ops::Range;

use crate::types::NodeId;

use super::Link;

/// Answers "which links leave node X" with two binary searches.
///
/// The link vector is kept sorted by start node and the index stores the
/// start node of every link in the same order as a search key vector.
/// The index is only valid for the link vector it was last rebuilt from;
/// every mutator of the link set has to call [`AdjacencyIndex::rebuild`]
/// before the next query.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyIndex {
    start_nodes: Vec<NodeId>,
}

impl AdjacencyIndex {
    /// Sorts `links` by start node and records the search keys.
    pub fn rebuild(&mut self, links: &mut Vec<Link>) {
        links.sort_by_key(|link| link.start_node);
        self.start_nodes.clear();
        self.start_nodes
            .extend(links.iter().map(|link| link.start_node));
    }

    /// The contiguous range of link positions with the given start node.
    #[inline(always)]
    pub fn range(&self, node: NodeId) -> Range<usize> {
        let first = self.start_nodes.partition_point(|&start| start < node);
        let last = self.start_nodes.partition_point(|&start| start <= node);
        first..last
    }
}
