/*! Word-lattice manipulation for leave-one-out decoding.

Implements the word-lattice operations needed to measure each word's
contribution to a speech recognition hypothesis: reading and writing
the HTK SLF text format, pruning the lattice by word exclusion with
cascading reference-counted deletion, exact enumeration of the paths
that spell a given word sequence through epsilon links, and a wrapper
around the external decoder that re-decodes a reduced lattice.

The lattice itself is produced by an external decoder; this crate only
manipulates it and hands a serialized form back.

# Usage example

```
use wordlattice::Lattice;

let slf = "\
start=0\n\
end=2\n\
I=0\n\
I=1\n\
I=2\n\
J=0\tS=0\tE=1\tW=hello\tl=-1.0\n\
J=1\tS=1\tE=2\tW=world\tl=-2.5\n";

let lattice = Lattice::read_slf(slf.as_bytes()).unwrap();
let paths = lattice.find_paths(&["hello", "world"]);
assert_eq!(paths.len(), 1);
```

Further examples can be found in the `wordlattice-bin` crate in the
same repository.
*/

#![warn(missing_docs)]

pub mod constants;
pub mod decoder;
pub mod lattice;
pub mod slf;
pub mod types;

pub use crate::decoder::{DecoderError, LatticeDecoder};
pub use crate::lattice::{Label, Lattice, Link, Node, Path};
pub use crate::slf::SlfError;
