//! # patchgen-sync
//!
//! Ref fetching, patch synthesis, patch file writing and run orchestration.
//!
//! Call [`pipeline::run_blocking`] to process every repository under a
//! container directory, or [`task::process_repo`] for a single clone.

pub mod error;
pub mod fetch;
pub mod git;
pub mod pipeline;
pub mod synth;
pub mod task;
pub mod writer;

pub use error::SyncError;
pub use git::{CommandOutput, GitCli, Vcs};
pub use pipeline::{run_blocking, RunRequest, RunSummary, TaskFailure};
pub use task::{process_repo, RepoOutcome, TaskOptions};
