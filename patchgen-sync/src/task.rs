//! One repository's work: fetch refs, synthesize patches, write the file.

use std::path::PathBuf;

use patchgen_core::{RepoName, Repository, ShaPairSet};

use crate::error::SyncError;
use crate::fetch::pull_refs;
use crate::git::Vcs;
use crate::synth::synthesize;
use crate::writer::write_patch_file;

/// Per-run settings shared by every repository task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    /// File extension (without the dot) that scopes every diff, e.g. `java`.
    pub lang_suffix: String,
    pub fetch_chunk_size: usize,
}

/// Successful outcome of one repository task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoOutcome {
    pub repo: RepoName,
    pub pairs: usize,
    pub patches: usize,
    pub bytes_written: usize,
    pub patch_path: PathBuf,
}

/// Run fetch → synthesize → write for `repo`, strictly in that order.
pub fn process_repo(
    vcs: &dyn Vcs,
    repo: &Repository,
    pairs: &ShaPairSet,
    options: &TaskOptions,
) -> Result<RepoOutcome, SyncError> {
    let patch_path = repo.patch_path();

    tracing::info!("Pulling refs...");
    let fetched = pull_refs(vcs, &repo.local_path, pairs, options.fetch_chunk_size)?;
    if fetched.failed_batches > 0 || !fetched.pull_refs_ok {
        tracing::debug!(
            "{} of {} SHA fetches failed, pull refs ok: {}",
            fetched.failed_batches,
            fetched.batches,
            fetched.pull_refs_ok
        );
    }

    tracing::info!("Generating patches...");
    let blocks = synthesize(vcs, &repo.local_path, pairs, &options.lang_suffix)?;
    tracing::info!(
        "Generated {} patches from {} build pairs.",
        blocks.len(),
        pairs.len()
    );

    tracing::info!("Writing patch file to {}...", patch_path.display());
    let bytes_written = write_patch_file(&patch_path, &blocks)?;
    tracing::info!("Wrote {} bytes to {}.", bytes_written, patch_path.display());
    tracing::info!("Finished!");

    Ok(RepoOutcome {
        repo: repo.name.clone(),
        pairs: pairs.len(),
        patches: blocks.len(),
        bytes_written,
        patch_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use patchgen_core::ShaPair;
    use tempfile::TempDir;

    use crate::git::CommandOutput;

    /// Logs the order of operations; every diff returns its range as body.
    #[derive(Default)]
    struct OrderVcs {
        log: Mutex<Vec<&'static str>>,
    }

    impl Vcs for OrderVcs {
        fn fetch(&self, _: &Path, _: &[String]) -> Result<CommandOutput, SyncError> {
            self.log.lock().unwrap().push("fetch");
            Ok(CommandOutput::ok(""))
        }

        fn diff(&self, _: &Path, range: &str, _: &str) -> Result<CommandOutput, SyncError> {
            self.log.lock().unwrap().push("diff");
            Ok(CommandOutput::ok(format!("{range}\n")))
        }
    }

    fn options() -> TaskOptions {
        TaskOptions {
            lang_suffix: "java".into(),
            fetch_chunk_size: 50,
        }
    }

    #[test]
    fn fetch_precedes_diff_and_file_is_written() {
        let root = TempDir::new().unwrap();
        let local_path = root.path().join("foo.bar");
        std::fs::create_dir(&local_path).unwrap();
        let repo = Repository {
            name: RepoName::from("foo/bar"),
            local_path,
        };
        let pairs: ShaPairSet = [ShaPair::new("a1", "b1")].into_iter().collect();

        let vcs = OrderVcs::default();
        let outcome = process_repo(&vcs, &repo, &pairs, &options()).expect("task");

        assert_eq!(*vcs.log.lock().unwrap(), vec!["fetch", "fetch", "diff"]);
        assert_eq!(outcome.pairs, 1);
        assert_eq!(outcome.patches, 1);
        assert_eq!(outcome.patch_path, root.path().join("foo.bar.patch"));
        assert_eq!(
            std::fs::read_to_string(&outcome.patch_path).unwrap(),
            "compare a1 b1\na1..b1\n\n"
        );
    }

    #[test]
    fn empty_pair_set_writes_single_newline() {
        let root = TempDir::new().unwrap();
        let local_path = root.path().join("foo.bar");
        std::fs::create_dir(&local_path).unwrap();
        let repo = Repository {
            name: RepoName::from("foo/bar"),
            local_path,
        };

        let outcome =
            process_repo(&OrderVcs::default(), &repo, &ShaPairSet::new(), &options()).expect("task");
        assert_eq!(outcome.patches, 0);
        assert_eq!(outcome.bytes_written, 1);
        assert_eq!(std::fs::read_to_string(&outcome.patch_path).unwrap(), "\n");
    }
}
