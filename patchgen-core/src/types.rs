//! Domain types for patch generation.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A repository name in `<owner>/<project>` form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl RepoName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A local clone discovered inside the repository container directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: RepoName,
    /// Absolute path to the clone on disk.
    pub local_path: PathBuf,
}

impl Repository {
    /// `<local_path>.patch`, a sibling of the clone directory.
    pub fn patch_path(&self) -> PathBuf {
        patch_path_for(&self.local_path)
    }
}

/// A (failed-build commit, passed-build commit) tuple driving one diff.
///
/// Ordering is by failed SHA, then passed SHA, which makes set iteration
/// (and therefore patch block order) deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShaPair {
    pub failed_sha: String,
    pub passed_sha: String,
}

impl ShaPair {
    pub fn new(failed_sha: impl Into<String>, passed_sha: impl Into<String>) -> Self {
        Self {
            failed_sha: failed_sha.into(),
            passed_sha: passed_sha.into(),
        }
    }

    /// `<failed>..<passed>` revision range.
    pub fn range(&self) -> String {
        format!("{}..{}", self.failed_sha, self.passed_sha)
    }
}

impl fmt::Display for ShaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.failed_sha, self.passed_sha)
    }
}

/// Distinct SHA pairs for one repository.
pub type ShaPairSet = BTreeSet<ShaPair>;

/// SHA pairs for every repository. Built once, read-only afterwards.
pub type ShaPairMap = BTreeMap<RepoName, ShaPairSet>;

/// One synthesized diff with its `compare` header.
///
/// `body` is the diff output exactly as git produced it. Sources are not
/// required to be UTF-8, so neither is the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchBlock {
    pub header: String,
    pub body: Vec<u8>,
}

impl PatchBlock {
    pub fn new(pair: &ShaPair, body: impl Into<Vec<u8>>) -> Self {
        Self {
            header: format!("compare {} {}", pair.failed_sha, pair.passed_sha),
            body: body.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Patch file layout
// ---------------------------------------------------------------------------

/// Render the full patch file: `header\nbody` per block, blocks separated by
/// a blank line, one trailing newline. No blocks renders as `"\n"`.
pub fn render_patch_file(blocks: &[PatchBlock]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\n\n");
        }
        out.extend_from_slice(block.header.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(&block.body);
    }
    out.push(b'\n');
    out
}

/// `<repo_dir>.patch`, keeping non-UTF-8 path bytes intact.
pub fn patch_path_for(repo_dir: &Path) -> PathBuf {
    let mut os: OsString = repo_dir.as_os_str().to_owned();
    os.push(".patch");
    PathBuf::from(os)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
