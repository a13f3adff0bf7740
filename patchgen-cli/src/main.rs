//! patchgen: generate language-scoped patch files for local repository clones.
//!
//! # Usage
//!
//! ```text
//! patchgen <REPO_CONTAINER_DIR> <LANG_SUFFIX> buildpairs
//! patchgen <REPO_CONTAINER_DIR> <LANG_SUFFIX> artifacts <ARTIFACT_FILE>
//!          [--max-concurrency N] [--fetch-chunk-size N] [--isolate-retrieval]
//!          [--config PATH] [--api-url URL]
//! ```
//!
//! Every child directory named `<owner>.<repo>` is treated as a clone of
//! `owner/repo`; its patch file is written next to it as `<owner>.<repo>.patch`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use patchgen_core::config::{self, Config};
use patchgen_metadata::{HttpMetadataClient, RetrievalPolicy, ShaPairSource, SourceMode};
use patchgen_sync::{run_blocking, GitCli, RunRequest, TaskOptions};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "patchgen",
    version,
    about = "Generate failed→passed patch files for local repository clones",
    long_about = None,
)]
struct Cli {
    /// Directory whose `<owner>.<repo>` children are git clones.
    repo_container_dir: PathBuf,

    /// File extension that scopes every diff, e.g. `java` or `py`.
    lang_suffix: String,

    /// Where SHA pairs come from: `buildpairs` or `artifacts`.
    mode: SourceMode,

    /// Newline-delimited image tags; required in `artifacts` mode.
    #[arg(required_if_eq("mode", "artifacts"))]
    artifact_file: Option<PathBuf>,

    /// Repositories processed at once.
    #[arg(long, value_name = "N")]
    max_concurrency: Option<usize>,

    /// SHAs passed to a single `git fetch`.
    #[arg(long, value_name = "N")]
    fetch_chunk_size: Option<usize>,

    /// Skip repositories or artifacts whose metadata lookup fails instead of
    /// aborting the run.
    #[arg(long)]
    isolate_retrieval: bool,

    /// Config file (default: ~/.patchgen/config.yaml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Metadata service base URL.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
}

impl Cli {
    /// Overlay command-line flags on the loaded config.
    fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(n) = self.max_concurrency {
            config.max_concurrency = n;
        }
        if let Some(n) = self.fetch_chunk_size {
            config.fetch_chunk_size = n;
        }
    }

    fn source(&self, config: &Config) -> Result<ShaPairSource> {
        match self.mode {
            SourceMode::BuildPairs => {
                if let Some(path) = &self.artifact_file {
                    tracing::warn!("ignoring {} in buildpairs mode", path.display());
                }
                Ok(ShaPairSource::BuildPairs {
                    ci_service: config.ci_service.clone(),
                })
            }
            SourceMode::Artifacts => {
                let artifact_file = self
                    .artifact_file
                    .clone()
                    .context("artifacts mode requires an ARTIFACT_FILE")?;
                Ok(ShaPairSource::Artifacts { artifact_file })
            }
        }
    }

    fn policy(&self) -> RetrievalPolicy {
        if self.isolate_retrieval {
            RetrievalPolicy::Isolate
        } else {
            RetrievalPolicy::Abort
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let code = run(&cli)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<i32> {
    let mut config = config::load(cli.config.as_deref()).context("failed to load config")?;
    cli.apply_to(&mut config);
    config.validate().context("invalid configuration")?;

    let request = RunRequest {
        container: cli.repo_container_dir.clone(),
        source: cli.source(&config)?,
        policy: cli.policy(),
        max_concurrency: config.max_concurrency,
        task: TaskOptions {
            lang_suffix: cli.lang_suffix.clone(),
            fetch_chunk_size: config.fetch_chunk_size,
        },
    };

    let service = HttpMetadataClient::new(config.api_url.clone(), config.api_token.clone());
    let vcs = Arc::new(GitCli::new(config.git_program.clone()));

    let summary = run_blocking(&request, &service, vcs).with_context(|| {
        format!(
            "patch generation aborted for {}",
            request.container.display()
        )
    })?;
    Ok(summary.exit_code())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
