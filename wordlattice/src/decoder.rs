//! Invocation of the external lattice decoder.
//!
//! The engine never decodes a lattice itself: an external decoder is
//! handed a serialized SLF file and prints the best-path word sequence
//! on standard output. This module owns that process boundary.

use std::path::PathBuf;
use std::process::Command;

use log::{debug, warn};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::constants::NO_NODE;
use crate::lattice::Lattice;

/// Errors from a decoder invocation. Never produced for the soft "no
/// path" outcome, which is a normal result.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// The lattice could not be serialized or the decoder could not be
    /// spawned.
    #[error("could not run the decoder")]
    Io(#[from] std::io::Error),

    /// The decoder exited with a non-zero status.
    #[error("decoder failed with {status}: {stderr}")]
    Failed {
        /// The decoder's exit status.
        status: std::process::ExitStatus,
        /// Everything the decoder wrote to standard error.
        stderr: String,
    },
}

/// Runs an external decoder over serialized lattices.
///
/// The decoder command receives the path of an SLF file as its last
/// argument. One process is spawned per decode; there is no retry
/// logic at this boundary.
#[derive(Clone, Debug)]
pub struct LatticeDecoder {
    command: PathBuf,
    args: Vec<String>,
}

impl LatticeDecoder {
    /// Creates a decoder wrapper for the given command.
    pub fn new<P: Into<PathBuf>>(command: P) -> LatticeDecoder {
        LatticeDecoder {
            command: command.into(),
            args: Vec::new(),
        }
    }

    /// Adds an argument passed to the decoder before the lattice path.
    pub fn arg<S: Into<String>>(mut self, arg: S) -> LatticeDecoder {
        self.args.push(arg.into());
        self
    }

    /// Decodes `lattice`, returning the best-path word sequence, or
    /// `None` when the decoder cannot reach the end node.
    ///
    /// A lattice whose end node is already the unreachable sentinel is
    /// `None` without spawning anything. The decoder signalling an
    /// unreachable end on standard error is also `None`; only a
    /// non-zero exit is a hard [`DecoderError::Failed`].
    pub fn decode(&self, lattice: &Lattice) -> Result<Option<String>, DecoderError> {
        if lattice.end_node() == NO_NODE {
            return Ok(None);
        }

        let mut slf_file = NamedTempFile::new()?;
        lattice.write_slf(&mut slf_file)?;

        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(slf_file.path())
            .output()?;

        if !output.status.success() {
            return Err(DecoderError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            if line.contains("warning") {
                warn!("decoder: {}", line);
                continue;
            }
            // Anything else on stderr means the end node was not
            // reachable.
            debug!("decoder reported no path: {}", line);
            return Ok(None);
        }

        let hypothesis = String::from_utf8_lossy(&output.stdout)
            .trim_end()
            .to_string();
        Ok(Some(hypothesis))
    }
}
