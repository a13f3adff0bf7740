//! Repository discovery.
//!
//! A container directory holds one clone per repository, named
//! `<owner>.<project>`:
//!
//! ```text
//! <container>/
//!   apache.commons-lang/      -> apache/commons-lang
//!   square.okhttp/            -> square/okhttp
//!   apache.commons-lang.patch (output from a previous run; ignored)
//!   notes.txt                 (ignored)
//! ```

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{io_err, CoreError};
use crate::types::{RepoName, Repository};

fn clone_dir_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([-\w]+)\.([-\w]+)$").expect("valid regex"))
}

/// Map a clone directory name to its repository name.
///
/// Returns `None` unless the name is exactly two word/hyphen tokens joined
/// by a single `.`.
pub fn repo_name_from_dir(dir_name: &str) -> Option<RepoName> {
    let caps = clone_dir_re().captures(dir_name)?;
    Some(RepoName::from(format!("{}/{}", &caps[1], &caps[2])))
}

/// Scan `container` once and return every qualifying clone directory.
///
/// Results keep the directory enumeration order. Entries that are not
/// directories, or whose names do not parse, are skipped.
pub fn discover_at(container: &Path) -> Result<Vec<Repository>, CoreError> {
    let container = absolute(container)?;
    let entries = std::fs::read_dir(&container).map_err(|e| io_err(&container, e))?;

    let mut repos = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&container, e))?;
        let is_dir = entry
            .file_type()
            .map(|t| t.is_dir() || (t.is_symlink() && entry.path().is_dir()))
            .unwrap_or(false);
        if !is_dir {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str().and_then(repo_name_from_dir) else {
            tracing::debug!("skipping {}", entry.path().display());
            continue;
        };
        repos.push(Repository {
            name,
            local_path: entry.path(),
        });
    }
    Ok(repos)
}

fn absolute(path: &Path) -> Result<PathBuf, CoreError> {
    std::path::absolute(path).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dir_names_map_to_owner_slash_project() {
        assert_eq!(repo_name_from_dir("foo.bar"), Some(RepoName::from("foo/bar")));
        assert_eq!(
            repo_name_from_dir("apache.commons-lang"),
            Some(RepoName::from("apache/commons-lang"))
        );
        assert_eq!(repo_name_from_dir("my_org.my_repo"), Some(RepoName::from("my_org/my_repo")));
    }

    #[test]
    fn non_matching_names_are_rejected() {
        for name in ["foobar", ".bar", "foo.", "foo.bar.patch", "foo bar.baz", "foo/bar"] {
            assert_eq!(repo_name_from_dir(name), None, "{name} should not match");
        }
    }

    #[test]
    fn discover_skips_files_and_non_matching_dirs() {
        let root = TempDir::new().expect("tempdir");
        std::fs::create_dir(root.path().join("foo.bar")).unwrap();
        std::fs::create_dir(root.path().join("not-a-clone")).unwrap();
        std::fs::write(root.path().join("foo.bar.patch"), "\n").unwrap();
        std::fs::write(root.path().join("baz.qux"), "file, not dir").unwrap();

        let repos = discover_at(root.path()).expect("discover");
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, RepoName::from("foo/bar"));
        assert!(repos[0].local_path.is_absolute());
        assert!(repos[0].local_path.ends_with("foo.bar"));
    }

    #[test]
    fn discover_missing_container_is_io_error() {
        let root = TempDir::new().expect("tempdir");
        let err = discover_at(&root.path().join("missing")).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("missing"));
    }
}
