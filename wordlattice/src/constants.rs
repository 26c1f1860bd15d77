//! Reserved labels and sentinels of the SLF lattice model.

use crate::types::NodeId;

/// The reserved epsilon label: a transition that consumes no word.
pub const NULL_LABEL: &str = "!NULL";

/// Sentence start label, skipped by per-word leave-one-out iteration.
pub const SENTENCE_START: &str = "<s>";

/// Sentence end label, skipped by per-word leave-one-out iteration.
pub const SENTENCE_END: &str = "</s>";

/// Sentinel node id meaning "no node". A lattice whose end node became
/// unreachable through pruning carries this as its end node id.
pub const NO_NODE: NodeId = -1;

/// SLF format version emitted in the header.
pub const SLF_VERSION: &str = "1.1";
