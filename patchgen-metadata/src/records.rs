//! Record shapes returned by the metadata service.
//!
//! Only the fields the pipeline reads are declared; everything else in the
//! documents is ignored. A missing required field surfaces as
//! [`MetadataError::Record`] naming the record kind.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use patchgen_core::{RepoName, ShaPair};

use crate::error::MetadataError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRef {
    pub head_sha: String,
}

/// A mined failing/passing build pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPairRecord {
    pub failed_build: BuildRef,
    pub passed_build: BuildRef,
}

impl BuildPairRecord {
    pub fn sha_pair(&self) -> ShaPair {
        ShaPair::new(&self.failed_build.head_sha, &self.passed_build.head_sha)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub trigger_sha: String,
}

/// A packaged reproduction, resolved from its image tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub repo: RepoName,
    pub failed_job: JobRef,
    pub passed_job: JobRef,
}

impl ArtifactRecord {
    pub fn sha_pair(&self) -> ShaPair {
        ShaPair::new(&self.failed_job.trigger_sha, &self.passed_job.trigger_sha)
    }
}

pub(crate) fn parse_record<T: DeserializeOwned>(
    kind: &'static str,
    value: Value,
) -> Result<T, MetadataError> {
    serde_json::from_value(value).map_err(|source| MetadataError::Record { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_pair_extracts_head_shas() {
        let record: BuildPairRecord = parse_record(
            "build pair",
            json!({
                "repo": "foo/bar",
                "failed_build": {"head_sha": "a1", "build_id": 1},
                "passed_build": {"head_sha": "b1", "build_id": 2},
                "jobpairs": []
            }),
        )
        .expect("parse");
        assert_eq!(record.sha_pair(), ShaPair::new("a1", "b1"));
    }

    #[test]
    fn artifact_extracts_trigger_shas() {
        let record: ArtifactRecord = parse_record(
            "artifact",
            json!({
                "image_tag": "foo-bar-123",
                "repo": "foo/bar",
                "failed_job": {"trigger_sha": "x", "job_id": 10},
                "passed_job": {"trigger_sha": "y", "job_id": 11}
            }),
        )
        .expect("parse");
        assert_eq!(record.repo, RepoName::from("foo/bar"));
        assert_eq!(record.sha_pair(), ShaPair::new("x", "y"));
    }

    #[test]
    fn missing_field_names_the_record_kind() {
        let err = parse_record::<BuildPairRecord>(
            "build pair",
            json!({"failed_build": {"head_sha": "a1"}}),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("malformed build pair record"), "got: {msg}");
        assert!(msg.contains("passed_build"), "got: {msg}");
    }

    #[test]
    fn nested_missing_field_is_reported() {
        let err = parse_record::<ArtifactRecord>(
            "artifact",
            json!({"repo": "foo/bar", "failed_job": {}, "passed_job": {"trigger_sha": "y"}}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("trigger_sha"), "got: {err}");
    }
}
