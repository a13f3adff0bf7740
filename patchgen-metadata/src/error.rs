//! Error types for patchgen-metadata.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while talking to the metadata service or
/// building the SHA-pair map.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Non-success HTTP status from the service.
    #[error("metadata service returned {status} for {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// The requested record does not exist.
    #[error("no {kind} found for '{key}'")]
    NotFound { kind: &'static str, key: String },

    /// Connection, DNS, TLS or similar failure before a response arrived.
    #[error("metadata service transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Response body was not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// A record is missing a required field or has the wrong shape.
    #[error("malformed {kind} record: {source}")]
    Record {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// I/O failure reading a local input, with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> MetadataError {
    MetadataError::Io {
        path: path.into(),
        source,
    }
}
