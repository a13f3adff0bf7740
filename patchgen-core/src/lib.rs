//! patchgen core library: domain types, repository discovery, config and errors.
//!
//! Public API surface:
//! - [`types`]: newtypes and domain structs
//! - [`chunk`]: fixed-size grouping for argument-limited commands
//! - [`discovery`]: scan a container directory for repository clones
//! - [`config`]: YAML config load / validate
//! - [`error`]: [`CoreError`]

pub mod chunk;
pub mod config;
pub mod discovery;
pub mod error;
pub mod types;

pub use chunk::{chunks, Chunks};
pub use config::Config;
pub use error::CoreError;
pub use types::{
    patch_path_for, render_patch_file, PatchBlock, RepoName, Repository, ShaPair, ShaPairMap,
    ShaPairSet,
};
