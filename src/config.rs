//! TOML configuration.
//!
//! ```toml
//! [registry]
//! repo = "cosmos/chain-registry"
//! branch = "master"
//! # exclude_globs = ["*testnets*", "*.*"]
//! # max_retries = 0
//!
//! [refresh]
//! interval_secs = 86400
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```
//!
//! Only `registry.repo` is required; every other key has a default.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub registry: RegistryConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    /// GitHub repository in `owner/repo` form.
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_raw_url")]
    pub raw_url: String,
    /// Top-level directories matching any of these globs are not chains.
    #[serde(default = "default_exclude_globs")]
    pub exclude_globs: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// Environment variable holding an optional GitHub token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_branch() -> String {
    "master".to_string()
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_raw_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}
fn default_exclude_globs() -> Vec<String> {
    vec!["*testnets*".to_string(), "*.*".to_string()]
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_fetch_concurrency() -> usize {
    8
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl RegistryConfig {
    /// Registry settings for `repo` with every other key at its default.
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: default_branch(),
            api_url: default_api_url(),
            raw_url: default_raw_url(),
            exclude_globs: default_exclude_globs(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            fetch_concurrency: default_fetch_concurrency(),
            token_env: default_token_env(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn exclude_set(&self) -> Result<GlobSet> {
        build_globset(&self.exclude_globs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    86_400
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    let registry = &config.registry;

    match registry.repo.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {}
        _ => bail!(
            "registry.repo must have the form 'owner/repo', got '{}'",
            registry.repo
        ),
    }

    if registry.branch.is_empty() {
        bail!("registry.branch must not be empty");
    }

    for (key, url) in [("api_url", &registry.api_url), ("raw_url", &registry.raw_url)] {
        reqwest::Url::parse(url)
            .with_context(|| format!("registry.{} is not a valid URL: '{}'", key, url))?;
    }

    if registry.timeout_secs == 0 {
        bail!("registry.timeout_secs must be > 0");
    }

    if registry.fetch_concurrency == 0 {
        bail!("registry.fetch_concurrency must be > 0");
    }

    registry
        .exclude_set()
        .with_context(|| "registry.exclude_globs contains an invalid glob")?;

    if config.refresh.interval_secs == 0 {
        bail!("refresh.interval_secs must be > 0");
    }

    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
