//! Run configuration.
//!
//! # Sources (later wins)
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. `<home>/.patchgen/config.yaml`, or an explicit `--config` path
//! 3. Environment: `PATCHGEN_API_URL`, `PATCHGEN_API_TOKEN`
//! 4. CLI flags (applied by the binary)
//!
//! # API pattern
//!
//! - `load_at(home, …)`: explicit home, used in tests with `TempDir`
//! - `load(…)`: derives home from `dirs::home_dir()` and delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

pub const DEFAULT_API_URL: &str = "https://api.bugswarm.org/v1";
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
pub const DEFAULT_FETCH_CHUNK_SIZE: usize = 50;

pub const ENV_API_URL: &str = "PATCHGEN_API_URL";
pub const ENV_API_TOKEN: &str = "PATCHGEN_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URL of the metadata service REST API.
    pub api_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Upper bound on repositories processed at once.
    pub max_concurrency: usize,
    /// SHAs per `git fetch` invocation.
    pub fetch_chunk_size: usize,
    pub git_program: PathBuf,
    /// CI service filter for build-pair queries.
    pub ci_service: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fetch_chunk_size: DEFAULT_FETCH_CHUNK_SIZE,
            git_program: PathBuf::from("git"),
            ci_service: "github".to_string(),
        }
    }
}

impl Config {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_concurrency == 0 {
            return Err(CoreError::InvalidConfig(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.fetch_chunk_size == 0 {
            return Err(CoreError::InvalidConfig(
                "fetch_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.api_url.trim().is_empty() {
            return Err(CoreError::InvalidConfig("api_url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Overlay `PATCHGEN_*` variables read through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
    }

    /// Overlay `PATCHGEN_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }
}

/// `<home>/.patchgen/config.yaml`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".patchgen").join("config.yaml")
}

/// Parse a config file.
pub fn load_file(path: &Path) -> Result<Config, CoreError> {
    if !path.exists() {
        return Err(CoreError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| CoreError::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load config from `explicit` if given (must exist), else from the default
/// location under `home` (may be absent), then overlay the environment.
pub fn load_at(home: &Path, explicit: Option<&Path>) -> Result<Config, CoreError> {
    let mut config = match explicit {
        Some(path) => load_file(path)?,
        None => {
            let path = default_path_at(home);
            if path.exists() {
                load_file(&path)?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env();
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load(explicit: Option<&Path>) -> Result<Config, CoreError> {
    let home = dirs::home_dir().ok_or(CoreError::HomeNotFound)?;
    load_at(&home, explicit)
}
