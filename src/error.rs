// src/error.rs
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures visible outside the pipeline.
///
/// Malformed input rows are deliberately absent: they are recovered where
/// they occur (the row is skipped and counted) and never propagate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration, rejected before any work starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A source file could not be fully read. Fatal to its reducer and,
    /// once every task has finished, to the whole aggregation.
    #[error("failed to read source {path:?}: {source}")]
    SourceRead { path: PathBuf, source: io::Error },

    /// The output destination already exists and no overwrite was requested.
    /// Recoverable: rerun with overwrite enabled.
    #[error("output file already exists: {0:?}")]
    OutputExists(PathBuf),

    /// The output file could not be created or written.
    #[error("failed to write output {path:?}: {source}")]
    OutputWrite { path: PathBuf, source: io::Error },

    /// A pipeline task died (panic, premature queue closure). Safety net for
    /// paths that cannot occur during a normal run.
    #[error("aggregation worker failed: {0}")]
    Worker(String),
}
