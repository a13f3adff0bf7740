//! Patch synthesis: one restricted diff per SHA pair.

use std::path::Path;

use patchgen_core::{PatchBlock, ShaPair, ShaPairSet};

use crate::error::SyncError;
use crate::git::Vcs;

/// Result of diffing one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Non-empty diff output, byte for byte.
    Changed(Vec<u8>),
    /// Diff succeeded but touched no file with the language suffix.
    Empty,
    /// Diff command exited non-zero (typically an unfetched SHA).
    Failed { status: Option<i32>, stderr: String },
}

/// `*.<suffix>` pathspec; a leading `.` on the suffix is tolerated.
pub fn lang_pathspec(lang_suffix: &str) -> String {
    format!("*.{}", lang_suffix.trim_start_matches('.'))
}

/// Diff `pair` inside `repo_dir`, restricted to `pathspec`.
pub fn diff_pair(
    vcs: &dyn Vcs,
    repo_dir: &Path,
    pair: &ShaPair,
    pathspec: &str,
) -> Result<DiffOutcome, SyncError> {
    let out = vcs.diff(repo_dir, &pair.range(), pathspec)?;
    if !out.success {
        return Ok(DiffOutcome::Failed {
            status: out.status,
            stderr: out.stderr,
        });
    }
    if out.stdout.is_empty() {
        return Ok(DiffOutcome::Empty);
    }
    Ok(DiffOutcome::Changed(out.stdout))
}

/// Build one [`PatchBlock`] per pair whose diff succeeded with non-empty
/// output, in set order. Failed and empty diffs are dropped.
pub fn synthesize(
    vcs: &dyn Vcs,
    repo_dir: &Path,
    pairs: &ShaPairSet,
    lang_suffix: &str,
) -> Result<Vec<PatchBlock>, SyncError> {
    let pathspec = lang_pathspec(lang_suffix);
    let mut blocks = Vec::new();
    for pair in pairs {
        match diff_pair(vcs, repo_dir, pair, &pathspec)? {
            DiffOutcome::Changed(body) => blocks.push(PatchBlock::new(pair, body)),
            DiffOutcome::Empty => tracing::trace!("{pair}: no {pathspec} changes"),
            DiffOutcome::Failed { status, stderr } => {
                tracing::debug!("{pair}: diff exited with {status:?}: {stderr}")
            }
        }
    }
    Ok(blocks)
}
