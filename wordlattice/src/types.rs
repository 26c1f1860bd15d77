//! Shared primitive types.

/// Node identifier. After parsing, node ids form a dense `0..N-1` range
/// and double as indices into the lattice's node vector.
pub type NodeId = i32;

/// Position of a link in the lattice's link vector. Only stable until
/// the next mutation of the lattice.
pub type LinkId = u32;

/// An additive log-domain cost.
pub type Score = f64;
