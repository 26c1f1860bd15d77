//! Exact path search through the lattice.

use log::debug;

use crate::constants::NO_NODE;
use crate::types::{LinkId, NodeId};

use super::{Lattice, Path};

impl Lattice {
    /// Enumerates every walk from the start node to the end node that
    /// spells exactly `words` once epsilon links are elided.
    ///
    /// The search is exhaustive by design: every combination of
    /// parallel links and epsilon detours is a separate result, so the
    /// worst case is exponential in the lattice's ambiguity. An empty
    /// result is a normal outcome, and the only possible outcome when
    /// the end node has become unreachable.
    pub fn find_paths(&self, words: &[&str]) -> Vec<Path> {
        if self.end_node == NO_NODE {
            return Vec::new();
        }

        let mut frontier = self.null_closure(vec![Path::new()]);
        for word in words {
            let mut extended = Vec::new();
            for path in &frontier {
                self.extensions(path, word, &mut extended);
            }
            frontier = self.null_closure(extended);
            debug!("{} tokens @ {}", frontier.len(), word);
            if frontier.is_empty() {
                return Vec::new();
            }
        }
        frontier.retain(|path| path.final_node() == self.end_node);
        frontier
    }

    // Expands every path through the epsilon links leaving its final
    // node, transitively, keeping the unexpanded paths as well: one
    // result per distinct epsilon-only suffix, including the empty one.
    fn null_closure(&self, paths: Vec<Path>) -> Vec<Path> {
        let mut result = Vec::with_capacity(paths.len());
        let mut work = paths;
        while let Some(path) = work.pop() {
            for position in self.link_range(self.continuation_node(&path)) {
                let link = &self.links[position];
                if link.word.is_null() {
                    work.push(path.extend(position as LinkId, link));
                }
            }
            result.push(path);
        }
        result
    }

    // All extensions of `path` over links labelled `word`.
    fn extensions(&self, path: &Path, word: &str, into: &mut Vec<Path>) {
        for position in self.link_range(self.continuation_node(path)) {
            let link = &self.links[position];
            if link.word.is_word(word) {
                into.push(path.extend(position as LinkId, link));
            }
        }
    }

    // The node a path continues from: its final node, or the global
    // start node for the empty path.
    fn continuation_node(&self, path: &Path) -> NodeId {
        if path.is_empty() {
            self.start_node
        } else {
            path.final_node()
        }
    }
}
