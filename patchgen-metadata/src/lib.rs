//! # patchgen-metadata
//!
//! Metadata-service records, the [`MetadataService`] seam with its HTTP
//! implementation, and the two SHA-pair retrieval strategies.

pub mod client;
pub mod error;
pub mod records;
pub mod source;

pub use client::{BuildPairFilter, HttpMetadataClient, MetadataService};
pub use error::MetadataError;
pub use records::{ArtifactRecord, BuildPairRecord};
pub use source::{RetrievalPolicy, ShaPairSource, SourceMode};
