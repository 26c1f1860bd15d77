//! The lattice graph store and reference-counted pruning.

pub mod index;
mod label;
mod path;
mod reachability;
mod search;

pub use self::label::Label;
pub use self::path::Path;

use hashbrown::{HashMap, HashSet};
use smol_str::SmolStr;

use crate::constants::NO_NODE;
use crate::types::{NodeId, Score};

use self::index::AdjacencyIndex;

/// A lattice node.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) time: i64,
    pub(crate) reference_count: i32,
}

impl Node {
    pub(crate) fn new(id: NodeId, time: i64) -> Node {
        Node {
            id,
            time,
            reference_count: 0,
        }
    }

    /// Node id; after parsing, a dense index into the node vector.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Informational frame index from the SLF input.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Number of inbound links, plus one if this is the start node.
    pub fn reference_count(&self) -> i32 {
        self.reference_count
    }
}

/// A scored transition between two nodes.
#[derive(Clone, Debug)]
pub struct Link {
    pub(crate) id: i32,
    pub(crate) start_node: NodeId,
    pub(crate) end_node: NodeId,
    pub(crate) word: Label,
    pub(crate) ac_score: Score,
    pub(crate) lm_score: Score,
}

impl Link {
    /// Link id as read from the SLF input.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// The node this link leaves from.
    pub fn start_node(&self) -> NodeId {
        self.start_node
    }

    /// The node this link arrives at.
    pub fn end_node(&self) -> NodeId {
        self.end_node
    }

    /// The word label.
    pub fn word(&self) -> &Label {
        &self.word
    }

    /// Acoustic log score.
    pub fn ac_score(&self) -> Score {
        self.ac_score
    }

    /// Language model log score.
    pub fn lm_score(&self) -> Score {
        self.lm_score
    }
}

/// A word lattice: alternative decoding hypotheses over a time-ordered
/// sequence, stored as a scored directed acyclic graph.
///
/// The lattice exclusively owns its nodes and links; paths and queries
/// refer to them by dense integer index. `Clone` produces a fully
/// independent deep copy with its own reference counts, so concurrent
/// leave-one-out variants of a base lattice never alias shared state.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,
    pub(crate) index: AdjacencyIndex,
    pub(crate) start_node: NodeId,
    pub(crate) end_node: NodeId,
    pub(crate) lm_scale: f64,
}

impl Lattice {
    /// The designated start node.
    pub fn start_node(&self) -> NodeId {
        self.start_node
    }

    /// The designated end node, or [`NO_NODE`] if pruning has made the
    /// original end node unreachable.
    pub fn end_node(&self) -> NodeId {
        self.end_node
    }

    /// The language model scale factor from the SLF header.
    pub fn lm_scale(&self) -> f64 {
        self.lm_scale
    }

    /// All nodes, indexed by node id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All links, sorted by start node.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The links leaving the given node.
    pub fn links_from(&self, node: NodeId) -> &[Link] {
        &self.links[self.index.range(node)]
    }

    /// The range of link positions leaving the given node.
    pub(crate) fn link_range(&self, node: NodeId) -> std::ops::Range<usize> {
        self.index.range(node)
    }

    /// The links of `path`, in traversal order.
    pub fn path_links<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Link> {
        path.links().iter().map(move |&p| &self.links[p as usize])
    }

    /// The words spelled by `path`, with epsilon links elided.
    pub fn path_words(&self, path: &Path) -> Vec<SmolStr> {
        self.path_links(path)
            .filter_map(|link| match &link.word {
                Label::Word(w) => Some(w.clone()),
                Label::Null => None,
            })
            .collect()
    }

    /// The set of words present in the lattice. The epsilon label is
    /// not a word and never appears in the result.
    pub fn words(&self) -> HashSet<SmolStr> {
        self.links
            .iter()
            .filter_map(|link| match &link.word {
                Label::Word(w) => Some(w.clone()),
                Label::Null => None,
            })
            .collect()
    }

    /// The set of node ids present in the lattice.
    pub fn node_ids(&self) -> HashSet<NodeId> {
        self.nodes.iter().map(|node| node.id).collect()
    }

    /// Removes every link labelled with one of `words`, cascading the
    /// removal to any structure that becomes unreachable as a result.
    ///
    /// Every removed link releases one reference from its end node; a
    /// node whose reference count reaches zero is removed together with
    /// its outgoing links, and the release propagates to their end
    /// nodes. If the end node goes, the lattice's end node id becomes
    /// [`NO_NODE`]. Excluding words absent from the lattice is a silent
    /// no-op; matching is exact, case-sensitive equality.
    pub fn remove_words(&mut self, words: &HashSet<SmolStr>) {
        let mut doomed_links = vec![false; self.links.len()];
        let mut doomed_nodes = vec![false; self.nodes.len()];

        for position in 0..self.links.len() {
            let excluded = match &self.links[position].word {
                Label::Word(w) => words.contains(w),
                Label::Null => false,
            };
            if excluded {
                doomed_links[position] = true;
                let end = self.links[position].end_node;
                self.unlink(end, &mut doomed_links, &mut doomed_nodes);
            }
        }

        // Links into or out of a doomed node go too, even when the node
        // was removed without its reference count reaching zero.
        for (position, link) in self.links.iter().enumerate() {
            if doomed_nodes[link.start_node as usize] || doomed_nodes[link.end_node as usize] {
                doomed_links[position] = true;
            }
        }

        if self.end_node != NO_NODE && doomed_nodes[self.end_node as usize] {
            self.end_node = NO_NODE;
        }

        let mut position = 0;
        self.links.retain(|_| {
            let keep = !doomed_links[position];
            position += 1;
            keep
        });
        let mut position = 0;
        self.nodes.retain(|_| {
            let keep = !doomed_nodes[position];
            position += 1;
            keep
        });

        self.renumber_nodes();
        self.rebuild_index();
    }

    /// Returns an independent copy of the lattice with all the links
    /// labelled with any of `words` removed. The receiver is untouched.
    pub fn without_words(&self, words: &HashSet<SmolStr>) -> Lattice {
        let mut result = self.clone();
        result.remove_words(words);
        result
    }

    // Releases one reference from a node, with an explicit work list in
    // place of recursion. A node whose count reaches zero is marked
    // doomed along with every link leaving it, and the release
    // propagates to those links' end nodes. Acyclicity bounds the walk.
    fn unlink(&mut self, node: NodeId, doomed_links: &mut [bool], doomed_nodes: &mut [bool]) {
        let mut work = vec![node];
        while let Some(node) = work.pop() {
            let entry = &mut self.nodes[node as usize];
            entry.reference_count -= 1;
            if entry.reference_count != 0 {
                continue;
            }
            doomed_nodes[node as usize] = true;
            for position in self.link_range(node) {
                doomed_links[position] = true;
                work.push(self.links[position].end_node);
            }
        }
    }

    // Gives nodes dense ids in order of appearance, so that a node id
    // can be used as an index into the node vector, and remaps every
    // link and start/end reference accordingly. The NO_NODE sentinel
    // passes through unchanged.
    pub(crate) fn renumber_nodes(&mut self) {
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::with_capacity(self.nodes.len());
        for (position, node) in self.nodes.iter_mut().enumerate() {
            mapping.insert(node.id, position as NodeId);
            node.id = position as NodeId;
        }
        for link in &mut self.links {
            link.start_node = mapping[&link.start_node];
            link.end_node = mapping[&link.end_node];
        }
        if self.start_node != NO_NODE {
            self.start_node = mapping[&self.start_node];
        }
        if self.end_node != NO_NODE {
            self.end_node = mapping[&self.end_node];
        }
    }

    // Sorts the links by start node and refreshes the adjacency index.
    // Has to be called before any query after the link set changed.
    pub(crate) fn rebuild_index(&mut self) {
        self.index.rebuild(&mut self.links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_set(words: &[&str]) -> HashSet<SmolStr> {
        words.iter().map(|w| SmolStr::new(*w)).collect()
    }

    // start --a--> 1 --!NULL--> 2 --b--> end
    fn chain() -> Lattice {
        let slf = "\
start=0\n\
end=3\n\
I=0\tt=0\n\
I=1\tt=1\n\
I=2\tt=2\n\
I=3\tt=3\n\
J=0\tS=0\tE=1\tW=a\ta=-10.0\tl=-1.0\n\
J=1\tS=1\tE=2\tW=!NULL\ta=0.0\tl=0.0\n\
J=2\tS=2\tE=3\tW=b\ta=-20.0\tl=-2.0\n";
        Lattice::read_slf(slf.as_bytes()).unwrap()
    }

    // Two branches from start to end; "sun" only on one of them.
    fn forked() -> Lattice {
        let slf = "\
start=0\n\
end=3\n\
I=0\n\
I=1\n\
I=2\n\
I=3\n\
J=0\tS=0\tE=1\tW=the\tl=-1.0\n\
J=1\tS=0\tE=2\tW=the\tl=-1.5\n\
J=2\tS=1\tE=3\tW=sun\tl=-2.0\n\
J=3\tS=2\tE=3\tW=son\tl=-2.5\n";
        Lattice::read_slf(slf.as_bytes()).unwrap()
    }

    #[test]
    fn excluding_the_only_path_cascades_to_the_end_node() {
        let mut lattice = chain();
        lattice.remove_words(&word_set(&["a"]));

        // Link a goes directly; node 1, the epsilon link, node 2, link b
        // and node 3 all cascade. Only the start node survives.
        assert_eq!(lattice.nodes().len(), 1);
        assert!(lattice.links().is_empty());
        assert_eq!(lattice.start_node(), 0);
        assert_eq!(lattice.end_node(), NO_NODE);
        assert_eq!(lattice.nodes()[0].reference_count(), 1);
    }

    #[test]
    fn excluding_one_branch_keeps_the_other() {
        let mut lattice = forked();
        lattice.remove_words(&word_set(&["sun"]));

        assert_eq!(lattice.nodes().len(), 3);
        assert_eq!(lattice.links().len(), 2);
        assert_eq!(lattice.words(), word_set(&["the", "son"]));
        assert_ne!(lattice.end_node(), NO_NODE);
    }

    #[test]
    fn remaining_nodes_stay_referenced_and_reachable() {
        let mut lattice = forked();
        lattice.remove_words(&word_set(&["son"]));

        let reachable = lattice.reachable_nodes(None);
        for node in lattice.nodes() {
            assert!(node.reference_count() >= 1);
            assert!(reachable.contains(&node.id()));
        }
        assert!(lattice.unreachable_nodes().is_empty());
    }

    #[test]
    fn removing_words_twice_is_a_no_op() {
        let mut lattice = forked();
        lattice.remove_words(&word_set(&["sun"]));
        let nodes = lattice.nodes().len();
        let links = lattice.links().len();
        let end = lattice.end_node();

        lattice.remove_words(&word_set(&["sun"]));
        assert_eq!(lattice.nodes().len(), nodes);
        assert_eq!(lattice.links().len(), links);
        assert_eq!(lattice.end_node(), end);
    }

    #[test]
    fn removing_an_absent_word_changes_nothing() {
        let mut lattice = chain();
        lattice.remove_words(&word_set(&["missing"]));
        assert_eq!(lattice.nodes().len(), 4);
        assert_eq!(lattice.links().len(), 3);
    }

    #[test]
    fn word_matching_is_case_sensitive() {
        let mut lattice = chain();
        lattice.remove_words(&word_set(&["A", "B"]));
        assert_eq!(lattice.links().len(), 3);
    }

    #[test]
    fn without_words_leaves_the_receiver_untouched() {
        let lattice = chain();
        let counts: Vec<i32> = lattice.nodes().iter().map(|n| n.reference_count()).collect();

        let reduced = lattice.without_words(&word_set(&["a"]));

        assert_eq!(lattice.nodes().len(), 4);
        assert_eq!(lattice.links().len(), 3);
        assert_eq!(lattice.end_node(), 3);
        let counts_after: Vec<i32> =
            lattice.nodes().iter().map(|n| n.reference_count()).collect();
        assert_eq!(counts, counts_after);

        assert_eq!(reduced.nodes().len(), 1);
        assert_eq!(reduced.end_node(), NO_NODE);
    }

    #[test]
    fn words_excludes_the_epsilon_label() {
        let lattice = chain();
        assert_eq!(lattice.words(), word_set(&["a", "b"]));
    }

    #[test]
    fn links_from_returns_the_sorted_slice() {
        let lattice = forked();
        let from_start = lattice.links_from(0);
        assert_eq!(from_start.len(), 2);
        assert!(from_start.iter().all(|link| link.start_node() == 0));
        assert!(lattice.links_from(3).is_empty());
    }
}
