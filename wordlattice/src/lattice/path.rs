//! An immutable walk through the lattice.

use serde::Serialize;

use crate::constants::NO_NODE;
use crate::types::{LinkId, NodeId, Score};

use super::Link;

/// An ordered sequence of links walked from a start position.
///
/// Paths are immutable values: [`Path::extend`] returns a new path and
/// never mutates a shared prefix, so a branching search can fan out
/// without aliasing. A path stores only link positions and cached
/// aggregates; it borrows its identities from the lattice it was built
/// against and is not meaningful after that lattice mutates.
#[derive(Clone, Debug, Serialize)]
pub struct Path {
    links: Vec<LinkId>,
    final_node: NodeId,
    total_ac_score: Score,
    total_lm_score: Score,
}

impl Path {
    /// Creates an empty path with no links.
    pub fn new() -> Path {
        Path {
            links: Vec::new(),
            final_node: NO_NODE,
            total_ac_score: 0.0,
            total_lm_score: 0.0,
        }
    }

    /// Whether the path contains no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of links in the path.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// The link positions in traversal order.
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// The node this path ends at, or [`NO_NODE`] for an empty path.
    pub fn final_node(&self) -> NodeId {
        self.final_node
    }

    /// Sum of the acoustic scores of the links.
    pub fn total_ac_score(&self) -> Score {
        self.total_ac_score
    }

    /// Sum of the language model scores of the links.
    pub fn total_lm_score(&self) -> Score {
        self.total_lm_score
    }

    /// Returns a new path extended by the link at `position`.
    pub fn extend(&self, position: LinkId, link: &Link) -> Path {
        let mut links = Vec::with_capacity(self.links.len() + 1);
        links.extend_from_slice(&self.links);
        links.push(position);
        Path {
            links,
            final_node: link.end_node,
            total_ac_score: self.total_ac_score + link.ac_score,
            total_lm_score: self.total_lm_score + link.lm_score,
        }
    }
}

impl Default for Path {
    fn default() -> Path {
        Path::new()
    }
}
