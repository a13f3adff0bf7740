//! Metadata service access.
//!
//! [`MetadataService`] is the seam the SHA-pair sources are written against.
//! [`HttpMetadataClient`] talks to the Eve-style REST API:
//!
//! ```text
//! GET {base}/minedBuildPairs?where=<json filter>   -> {"_items": [...], "_links": {"next": {"href": ...}}}
//! GET {base}/artifacts/image_tag/<tag>             -> {artifact document}
//! ```
//!
//! Every request carries `Authorization: token <token>` when a token is
//! configured.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use patchgen_core::RepoName;

use crate::error::MetadataError;
use crate::records::{parse_record, ArtifactRecord, BuildPairRecord};

/// Query filter for mined build pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPairFilter {
    pub repo: RepoName,
    pub ci_service: String,
}

impl BuildPairFilter {
    pub fn new(repo: RepoName, ci_service: impl Into<String>) -> Self {
        Self {
            repo,
            ci_service: ci_service.into(),
        }
    }
}

/// The two queries the pipeline needs from the system of record.
///
/// Implementations must tolerate concurrent calls from several threads.
pub trait MetadataService: Send + Sync {
    fn filter_mined_build_pairs(
        &self,
        filter: &BuildPairFilter,
    ) -> Result<Vec<BuildPairRecord>, MetadataError>;

    fn find_artifact(&self, image_tag: &str) -> Result<ArtifactRecord, MetadataError>;
}

/// Blocking HTTP client backed by a pooled `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct HttpMetadataClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpMetadataClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("patchgen/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, MetadataError> {
        let mut request = self.agent.get(url).set("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("token {token}"));
        }
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => response.into_json::<Value>().map_err(|source| MetadataError::Body {
                url: url.to_string(),
                source,
            }),
            Err(ureq::Error::Status(status, response)) => Err(MetadataError::Status {
                url: url.to_string(),
                status,
                body: response.into_string().unwrap_or_default().trim().to_string(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(MetadataError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            }),
        }
    }
}

impl MetadataService for HttpMetadataClient {
    fn filter_mined_build_pairs(
        &self,
        filter: &BuildPairFilter,
    ) -> Result<Vec<BuildPairRecord>, MetadataError> {
        let filter_json = serde_json::to_string(filter).map_err(|source| MetadataError::Record {
            kind: "build pair filter",
            source,
        })?;

        let mut records = Vec::new();
        let mut visited = HashSet::new();
        let mut page = self.get_json(
            &self.endpoint("minedBuildPairs"),
            &[("where", filter_json.as_str())],
        )?;
        loop {
            for item in take_items(&mut page) {
                records.push(parse_record("build pair", item)?);
            }
            let Some(next) = next_href(&page) else {
                break;
            };
            let url = self.endpoint(&next);
            if !visited.insert(url.clone()) {
                tracing::warn!("page link {url} was already followed; stopping pagination");
                break;
            }
            tracing::debug!("following page link {url}");
            page = self.get_json(&url, &[])?;
        }
        Ok(records)
    }

    fn find_artifact(&self, image_tag: &str) -> Result<ArtifactRecord, MetadataError> {
        let url = self.endpoint(&format!(
            "artifacts/image_tag/{}",
            urlencoding::encode(image_tag)
        ));
        let document = match self.get_json(&url, &[]) {
            Err(MetadataError::Status { status: 404, .. }) => {
                return Err(MetadataError::NotFound {
                    kind: "artifact",
                    key: image_tag.to_string(),
                })
            }
            other => other?,
        };
        parse_record("artifact", document)
    }
}

fn take_items(page: &mut Value) -> Vec<Value> {
    match page.get_mut("_items").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn next_href(page: &Value) -> Option<String> {
    page.pointer("/_links/next/href")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_joins_relative_paths() {
        let client = HttpMetadataClient::new("http://localhost:5000/v1/", None);
        assert_eq!(client.base_url(), "http://localhost:5000/v1");
        assert_eq!(
            client.endpoint("minedBuildPairs?page=2"),
            "http://localhost:5000/v1/minedBuildPairs?page=2"
        );
        assert_eq!(
            client.endpoint("/artifacts/image_tag/x"),
            "http://localhost:5000/v1/artifacts/image_tag/x"
        );
        assert_eq!(client.endpoint("https://other/x"), "https://other/x");
    }

    #[test]
    fn filter_serializes_as_where_clause() {
        let filter = BuildPairFilter::new(RepoName::from("foo/bar"), "github");
        assert_eq!(
            serde_json::to_string(&filter).unwrap(),
            r#"{"repo":"foo/bar","ci_service":"github"}"#
        );
    }

    #[test]
    fn page_helpers_read_eve_envelope() {
        let mut page = json!({
            "_items": [{"a": 1}, {"a": 2}],
            "_links": {"next": {"href": "minedBuildPairs?page=2"}}
        });
        assert_eq!(next_href(&page).as_deref(), Some("minedBuildPairs?page=2"));
        assert_eq!(take_items(&mut page).len(), 2);

        let last = json!({"_items": [], "_links": {"self": {"href": "x"}}});
        assert_eq!(next_href(&last), None);
    }
}
