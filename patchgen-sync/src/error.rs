//! Error types for patchgen-sync.

use std::path::PathBuf;

use thiserror::Error;

use patchgen_core::CoreError;
use patchgen_metadata::MetadataError;

/// All errors that can arise from fetching, diffing, writing and dispatch.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Discovery or config failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// SHA-pair retrieval failure.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The version-control program could not be started at all.
    #[error("failed to run {program} in {dir}: {source}")]
    Spawn {
        program: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker runtime could not be built or was shut down.
    #[error("worker runtime error: {0}")]
    Runtime(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
