//! Ref fetching.
//!
//! Best-effort: a failed fetch (unknown SHA, network error, missing PR refs)
//! is logged and counted, never raised. A SHA that could not be fetched shows
//! up later as a failed diff for its pair.

use std::collections::BTreeSet;
use std::path::Path;

use patchgen_core::{chunks, ShaPairSet};

use crate::error::SyncError;
use crate::git::{Vcs, PULL_REQUEST_REFSPEC};

/// What the fetch step did, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchReport {
    /// Explicit-SHA fetch invocations.
    pub batches: usize,
    pub failed_batches: usize,
    pub pull_refs_ok: bool,
}

/// Distinct union of failed and passed SHAs across `pairs`.
pub fn distinct_shas(pairs: &ShaPairSet) -> BTreeSet<&str> {
    pairs
        .iter()
        .flat_map(|p| [p.failed_sha.as_str(), p.passed_sha.as_str()])
        .collect()
}

/// Fetch every referenced SHA from `origin` in batches of `chunk_size`, then
/// fetch all pull-request heads into `refs/remotes/origin/pr/*`.
pub fn pull_refs(
    vcs: &dyn Vcs,
    repo_dir: &Path,
    pairs: &ShaPairSet,
    chunk_size: usize,
) -> Result<FetchReport, SyncError> {
    let mut report = FetchReport::default();

    for batch in chunks(distinct_shas(pairs), chunk_size) {
        let refspecs: Vec<String> = batch.into_iter().map(str::to_string).collect();
        let out = vcs.fetch(repo_dir, &refspecs)?;
        report.batches += 1;
        if !out.success {
            report.failed_batches += 1;
            tracing::debug!(
                "fetch of {} SHAs exited with {:?}: {}",
                refspecs.len(),
                out.status,
                out.stderr
            );
        }
    }

    let out = vcs.fetch(repo_dir, &[PULL_REQUEST_REFSPEC.to_string()])?;
    report.pull_refs_ok = out.success;
    if !out.success {
        tracing::debug!("pull request ref fetch exited with {:?}: {}", out.status, out.stderr);
    }

    Ok(report)
}
