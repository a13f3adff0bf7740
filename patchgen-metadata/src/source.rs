//! SHA-pair retrieval.
//!
//! Runs once per process, before any repository work is dispatched. The
//! resulting map is read-only afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use patchgen_core::{Repository, ShaPairMap};

use crate::client::{BuildPairFilter, MetadataService};
use crate::error::{io_err, MetadataError};

/// What to do when a single repository or artifact lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalPolicy {
    /// The first failure aborts retrieval (and the run).
    #[default]
    Abort,
    /// Log the failure, skip that repository/artifact, keep going.
    Isolate,
}

/// Where SHA pairs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaPairSource {
    /// Query mined build pairs for every discovered repository.
    BuildPairs { ci_service: String },
    /// Resolve each image tag listed in a newline-delimited file.
    Artifacts { artifact_file: PathBuf },
}

impl ShaPairSource {
    /// Build the SHA-pair map for `repos`.
    ///
    /// `repos` is only consulted in build-pairs mode; artifacts mode keys the
    /// map by whatever repository each artifact names.
    pub fn retrieve(
        &self,
        service: &dyn MetadataService,
        repos: &[Repository],
        policy: RetrievalPolicy,
    ) -> Result<ShaPairMap, MetadataError> {
        match self {
            ShaPairSource::BuildPairs { ci_service } => {
                from_build_pairs(service, repos, ci_service, policy)
            }
            ShaPairSource::Artifacts { artifact_file } => {
                from_artifacts(service, artifact_file, policy)
            }
        }
    }

    pub fn mode(&self) -> SourceMode {
        match self {
            ShaPairSource::BuildPairs { .. } => SourceMode::BuildPairs,
            ShaPairSource::Artifacts { .. } => SourceMode::Artifacts,
        }
    }
}

/// The mode identifier as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    BuildPairs,
    Artifacts,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buildpairs" => Ok(Self::BuildPairs),
            "artifacts" => Ok(Self::Artifacts),
            other => Err(format!(
                "unsupported mode '{other}'; expected: buildpairs, artifacts"
            )),
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceMode::BuildPairs => write!(f, "buildpairs"),
            SourceMode::Artifacts => write!(f, "artifacts"),
        }
    }
}

/// One build-pair query per repository, filtered to `ci_service`.
pub fn from_build_pairs(
    service: &dyn MetadataService,
    repos: &[Repository],
    ci_service: &str,
    policy: RetrievalPolicy,
) -> Result<ShaPairMap, MetadataError> {
    let mut shas = ShaPairMap::new();
    for repo in repos {
        let filter = BuildPairFilter::new(repo.name.clone(), ci_service);
        let records = match service.filter_mined_build_pairs(&filter) {
            Ok(records) => records,
            Err(err) => {
                skip_or_abort(policy, &repo.name, err)?;
                continue;
            }
        };
        tracing::debug!("{}: {} build pairs", repo.name, records.len());
        shas.entry(repo.name.clone())
            .or_default()
            .extend(records.iter().map(|r| r.sha_pair()));
    }
    Ok(shas)
}

/// Resolve every image tag in `artifact_file` and group pairs by repository.
pub fn from_artifacts(
    service: &dyn MetadataService,
    artifact_file: &Path,
    policy: RetrievalPolicy,
) -> Result<ShaPairMap, MetadataError> {
    let contents =
        std::fs::read_to_string(artifact_file).map_err(|e| io_err(artifact_file, e))?;

    let mut shas = ShaPairMap::new();
    for image_tag in read_image_tags(&contents) {
        let artifact = match service.find_artifact(image_tag) {
            Ok(artifact) => artifact,
            Err(err) => {
                skip_or_abort(policy, image_tag, err)?;
                continue;
            }
        };
        let pair = artifact.sha_pair();
        shas.entry(artifact.repo).or_default().insert(pair);
    }
    Ok(shas)
}

/// Non-blank, trimmed lines.
pub fn read_image_tags(contents: &str) -> impl Iterator<Item = &str> {
    contents.lines().map(str::trim).filter(|l| !l.is_empty())
}

fn skip_or_abort(
    policy: RetrievalPolicy,
    key: impl fmt::Display,
    err: MetadataError,
) -> Result<(), MetadataError> {
    match policy {
        RetrievalPolicy::Abort => Err(err),
        RetrievalPolicy::Isolate => {
            tracing::warn!("{key}: skipping, metadata lookup failed: {err}");
            Ok(())
        }
    }
}

/// Total pairs across all repositories, for summary logging.
pub fn pair_count(map: &ShaPairMap) -> usize {
    map.values().map(|set| set.len()).sum()
}
