//! Version-control command runner.
//!
//! [`Vcs`] is the seam between the pipeline and `git`. [`GitCli`] shells out
//! to the git binary; tests substitute scripted implementations.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SyncError;

/// Refspec mapping every pull-request head onto a local remote-tracking ref.
pub const PULL_REQUEST_REFSPEC: &str = "refs/pull/*/head:refs/remotes/origin/pr/*";

/// Captured result of one finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` when terminated by a signal.
    pub status: Option<i32>,
    /// Raw stdout; diff text keeps the encoding of the files it covers.
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: Some(status),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }
}

/// The version-control operations the pipeline needs.
///
/// A non-zero exit is reported through [`CommandOutput::success`]; only a
/// failure to start the command is an `Err`.
pub trait Vcs: Send + Sync {
    /// `git fetch origin <refspecs...>` inside `repo_dir`.
    fn fetch(&self, repo_dir: &Path, refspecs: &[String]) -> Result<CommandOutput, SyncError>;

    /// `git diff <range> -- <pathspec>` inside `repo_dir`.
    fn diff(&self, repo_dir: &Path, range: &str, pathspec: &str)
        -> Result<CommandOutput, SyncError>;
}

/// [`Vcs`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, repo_dir: &Path, args: &[&str]) -> Result<CommandOutput, SyncError> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(repo_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|source| SyncError::Spawn {
                program: self.program.display().to_string(),
                dir: repo_dir.to_path_buf(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl Vcs for GitCli {
    fn fetch(&self, repo_dir: &Path, refspecs: &[String]) -> Result<CommandOutput, SyncError> {
        let mut args = vec!["fetch", "origin"];
        args.extend(refspecs.iter().map(String::as_str));
        self.run(repo_dir, &args)
    }

    fn diff(
        &self,
        repo_dir: &Path,
        range: &str,
        pathspec: &str,
    ) -> Result<CommandOutput, SyncError> {
        self.run(repo_dir, &["diff", range, "--", pathspec])
    }
}
