//! Run orchestration: discover → retrieve SHA pairs → fan out one task per
//! repository onto a bounded worker pool → aggregate failures.
//!
//! Tasks are blocking (git subprocesses, file I/O), so each runs on tokio's
//! blocking pool; a semaphore caps how many run at once. A task that returns
//! an error or panics is logged and counted; it never stops the others.
//! There is no retry, timeout or cancellation: a hung `git` holds its slot
//! until it exits.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use patchgen_core::{discovery, CoreError, RepoName, Repository, ShaPairMap, ShaPairSet};
use patchgen_metadata::{source::pair_count, MetadataService, RetrievalPolicy, ShaPairSource};

use crate::error::SyncError;
use crate::git::Vcs;
use crate::task::{process_repo, RepoOutcome, TaskOptions};

/// Everything one run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Directory whose children are candidate clones.
    pub container: PathBuf,
    pub source: ShaPairSource,
    pub policy: RetrievalPolicy,
    pub max_concurrency: usize,
    pub task: TaskOptions,
}

/// A repository task that raised or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub repo: RepoName,
    pub detail: String,
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Repositories dispatched.
    pub repositories: usize,
    pub outcomes: Vec<RepoOutcome>,
    pub failures: Vec<TaskFailure>,
}

impl RunSummary {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// `1` if any repository task failed, else `0`.
    pub fn exit_code(&self) -> i32 {
        if self.failures.is_empty() {
            0
        } else {
            1
        }
    }
}

/// Run the whole pipeline on a fresh multi-threaded runtime and block until
/// every repository task has finished.
///
/// Errors here are run-level (discovery, retrieval, runtime); per-repository
/// failures are reported inside the returned [`RunSummary`].
pub fn run_blocking(
    request: &RunRequest,
    service: &dyn MetadataService,
    vcs: Arc<dyn Vcs>,
) -> Result<RunSummary, SyncError> {
    if request.max_concurrency == 0 {
        return Err(CoreError::InvalidConfig("max_concurrency must be at least 1".into()).into());
    }
    if request.task.fetch_chunk_size == 0 {
        return Err(CoreError::InvalidConfig("fetch_chunk_size must be at least 1".into()).into());
    }

    tracing::info!("Mode: {}", request.source.mode());
    let repos = discovery::discover_at(&request.container)?;
    tracing::info!("Found {} repositories in {}", repos.len(), request.container.display());

    tracing::info!("Getting SHA pairs...");
    let shas = request.source.retrieve(service, &repos, request.policy)?;
    tracing::info!(
        "Got {} SHA pairs across {} repositories",
        pair_count(&shas),
        shas.len()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| SyncError::Runtime(format!("failed to start runtime: {e}")))?;

    let summary = runtime.block_on(dispatch(
        repos,
        Arc::new(shas),
        vcs,
        Arc::new(request.task.clone()),
        request.max_concurrency,
    ));

    if summary.failure_count() > 0 {
        tracing::error!("{} task(s) failed.", summary.failure_count());
    }
    tracing::info!("Processed {} repos. Done!", summary.repositories);
    Ok(summary)
}

/// Fan out one task per repository, at most `max_concurrency` at a time, and
/// wait for all of them.
pub async fn dispatch(
    repos: Vec<Repository>,
    shas: Arc<ShaPairMap>,
    vcs: Arc<dyn Vcs>,
    options: Arc<TaskOptions>,
    max_concurrency: usize,
) -> RunSummary {
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let repositories = repos.len();

    for repo in repos {
        let permits = permits.clone();
        let shas = shas.clone();
        let vcs = vcs.clone();
        let options = options.clone();
        tasks.spawn(async move {
            let name = repo.name.clone();
            let Ok(_permit) = permits.acquire_owned().await else {
                return (name, Err("worker pool closed before task started".to_string()));
            };
            let joined = tokio::task::spawn_blocking(move || {
                let span = tracing::info_span!("repo", name = %repo.name);
                let _enter = span.enter();
                let empty = ShaPairSet::new();
                let pairs = shas.get(&repo.name).unwrap_or(&empty);
                process_repo(vcs.as_ref(), &repo, pairs, &options)
            })
            .await;
            let result = match joined {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(err)) => Err(err.to_string()),
                Err(join_err) => Err(describe_join_error(join_err)),
            };
            (name, result)
        });
    }

    let mut summary = RunSummary {
        repositories,
        ..RunSummary::default()
    };
    while let Some(joined) = tasks.join_next().await {
        let (repo, result) = match joined {
            Ok(pair) => pair,
            Err(join_err) => (RepoName::from("<unknown>"), Err(describe_join_error(join_err))),
        };
        match result {
            Ok(outcome) => summary.outcomes.push(outcome),
            Err(detail) => {
                tracing::error!("{repo}: task failed: {detail}");
                summary.failures.push(TaskFailure { repo, detail });
            }
        }
    }

    summary.outcomes.sort_by(|a, b| a.repo.cmp(&b.repo));
    summary.failures.sort_by(|a, b| a.repo.cmp(&b.repo));
    summary
}

fn describe_join_error(err: JoinError) -> String {
    if err.is_panic() {
        return format!("task panicked: {}", panic_message(err.into_panic()));
    }
    format!("task did not complete: {err}")
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "non-string panic payload".to_string()
}
