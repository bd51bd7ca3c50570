//! Engine error taxonomy.
//!
//! Every variant is recoverable from the point of view of the refresh loop:
//! the current pass is abandoned and the next tick starts from scratch.

use crate::build::Build;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
    /// No process handle could be opened.
    #[error("cannot attach to process: {0}")]
    Attach(String),

    /// A handle exists but the running game is not a supported build.
    #[error("no supported game detected ({0})")]
    NoGameDetected(String),

    /// The build is known but has no layout/address row.
    #[error("no struct layout known for build {0}")]
    UnknownSchema(Build),

    #[error("memory access failed at {address:#x} ({len} bytes)")]
    Access {
        address: u32,
        len: usize,
        #[source]
        source: std::io::Error,
    },

    /// Traversal guard tripped (cycle or corrupted node memory).
    #[error("maximum DAG size exceeded ({limit} nodes)")]
    MaxSizeExceeded { limit: usize },

    #[error("corrupt node at {address:#x}: {detail}")]
    CorruptNode { address: u32, detail: String },
}

pub type DagResult<T> = std::result::Result<T, DagError>;
