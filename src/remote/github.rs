//! GitHub-backed [`RemoteDirectory`].
//!
//! Uses three endpoints, all parameterised by the configured `owner/repo`
//! and branch:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list entries | `GET {api_url}/repos/{repo}/contents?ref={branch}` |
//! | fetch document | `GET {raw_url}/{repo}/{branch}/{entry}/{file}` |
//! | change check | `GET {api_url}/repos/{repo}/commits?sha={branch}&since={ts}&per_page=1` |
//!
//! # Authentication
//!
//! Anonymous GitHub API access is limited to 60 requests per hour. When the
//! environment variable named by `registry.token_env` (default
//! `GITHUB_TOKEN`) is set, its value is sent as a bearer token.
//!
//! # Retries
//!
//! Network errors, HTTP 429 and 5xx are retried up to `registry.max_retries`
//! times with exponential backoff (1s, 2s, 4s, ...). The default is no
//! inline retry: a failed pass is retried by the next scheduled refresh.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{DirEntry, EntryKind, RemoteDirectory};
use crate::config::RegistryConfig;
use crate::error::RemoteError;
use skymap_core::models::DocumentKind;

/// One element of the GitHub contents API listing.
#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// [`RemoteDirectory`] over a GitHub repository.
///
/// Listing and change checks go through the REST API; documents are read
/// from the raw-content host.
pub struct GithubDirectory {
    http: reqwest::Client,
    repo: String,
    branch: String,
    api_url: String,
    raw_url: String,
    token: Option<String>,
    max_retries: u32,
}

impl GithubDirectory {
    /// Build a client for the configured registry.
    ///
    /// Each instance owns its own HTTP client with the configured per-call
    /// timeout.
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("skymap/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            http,
            repo: config.repo.clone(),
            branch: config.branch.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            raw_url: config.raw_url.trim_end_matches('/').to_string(),
            token,
            max_retries: config.max_retries,
        })
    }

    fn contents_url(&self) -> Result<Url, RemoteError> {
        let base = format!("{}/repos/{}/contents", self.api_url, self.repo);
        Url::parse_with_params(&base, &[("ref", self.branch.as_str())])
            .map_err(|e| RemoteError::transport(base, e))
    }

    /// Raw-content URL of one document. The entry name is a single
    /// percent-encoded path segment; `repo` and `branch` may span several.
    fn document_url(&self, entry: &str, kind: DocumentKind) -> Result<Url, RemoteError> {
        let mut url = Url::parse(&self.raw_url)
            .map_err(|e| RemoteError::transport(self.raw_url.as_str(), e))?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::transport(self.raw_url.as_str(), "not a base url"))?
            .pop_if_empty()
            .extend(self.repo.split('/'))
            .extend(self.branch.split('/'))
            .extend([entry, kind.file_name()]);
        Ok(url)
    }

    fn commits_url(&self, since: DateTime<Utc>) -> Result<Url, RemoteError> {
        let base = format!("{}/repos/{}/commits", self.api_url, self.repo);
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        Url::parse_with_params(
            &base,
            &[
                ("sha", self.branch.as_str()),
                ("since", since.as_str()),
                ("per_page", "1"),
            ],
        )
        .map_err(|e| RemoteError::transport(base, e))
    }

    /// GET `url`, returning `None` on 404.
    async fn get(&self, url: Url) -> Result<Option<Vec<u8>>, RemoteError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(%url, attempt, ?delay, "retrying registry request");
                tokio::time::sleep(delay).await;
            }

            let mut request = self.http.get(url.clone());
            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(RemoteError::transport(url.as_str(), e));
                    continue;
                }
            };

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_err = Some(RemoteError::UnexpectedStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
                continue;
            }
            if !status.is_success() {
                return Err(RemoteError::UnexpectedStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            match response.bytes().await {
                Ok(body) => return Ok(Some(body.to_vec())),
                Err(e) => {
                    last_err = Some(RemoteError::transport(url.as_str(), e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            RemoteError::transport(url.as_str(), "request failed after retries")
        }))
    }

    /// GET `url` where a 404 means the request itself is wrong.
    async fn get_required(&self, url: Url) -> Result<Vec<u8>, RemoteError> {
        let display = url.to_string();
        self.get(url)
            .await?
            .ok_or(RemoteError::UnexpectedStatus {
                url: display,
                status: StatusCode::NOT_FOUND.as_u16(),
            })
    }
}

#[async_trait]
impl RemoteDirectory for GithubDirectory {
    async fn list_entries(&self) -> Result<Vec<DirEntry>, RemoteError> {
        let url = self.contents_url()?;
        let display = url.to_string();
        let body = self.get_required(url).await?;
        decode_listing(&body).map_err(|e| RemoteError::decode(display, e))
    }

    async fn fetch_document(
        &self,
        entry: &str,
        kind: DocumentKind,
    ) -> Result<Option<Vec<u8>>, RemoteError> {
        let url = self.document_url(entry, kind)?;
        self.get(url).await
    }

    async fn has_changed_since(&self, since: DateTime<Utc>) -> Result<bool, RemoteError> {
        let url = self.commits_url(since)?;
        let display = url.to_string();
        let body = self.get_required(url).await?;
        let commits: Vec<serde_json::Value> =
            serde_json::from_slice(&body).map_err(|e| RemoteError::decode(display, e))?;
        Ok(!commits.is_empty())
    }
}

fn decode_listing(body: &[u8]) -> Result<Vec<DirEntry>, serde_json::Error> {
    let entries: Vec<ContentEntry> = serde_json::from_slice(body)?;
    Ok(entries
        .into_iter()
        .map(|e| DirEntry {
            kind: match e.kind.as_str() {
                "dir" => EntryKind::Dir,
                "file" => EntryKind::File,
                _ => EntryKind::Other,
            },
            name: e.name,
        })
        .collect())
}
