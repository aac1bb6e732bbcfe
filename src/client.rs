//! Typed client for the skymap HTTP read API.
//!
//! Mirrors the routes in [`crate::server`]. Path segments are
//! percent-encoded, so chain names and asset display names containing
//! `/` or spaces are safe to pass through.
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), skymap::client::ClientError> {
//! use skymap::client::SkymapClient;
//! use skymap::models::EndpointKind;
//!
//! let client = SkymapClient::new("http://127.0.0.1:8080")?;
//! for name in client.chains().await? {
//!     let rpc = client.endpoints(&name, EndpointKind::Rpc).await?;
//!     println!("{}: {} rpc endpoints", name, rpc.len());
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::server::HealthResponse;
use skymap_core::models::{ApiEndpoint, Asset, Chain, EndpointKind, Peer};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Response of `GET /v1/chain/{chain}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChainInfo {
    Resolved(Box<Chain>),
    /// The chain's directory exists but has no `chain.json`.
    Unresolved { chain_name: String },
}

impl ChainInfo {
    pub fn chain(&self) -> Option<&Chain> {
        match self {
            ChainInfo::Resolved(chain) => Some(&**chain),
            ChainInfo::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndpointList {
    Api(Vec<ApiEndpoint>),
    Peers(Vec<Peer>),
}

impl EndpointList {
    pub fn len(&self) -> usize {
        match self {
            EndpointList::Api(list) => list.len(),
            EndpointList::Peers(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// HTTP client for a running skymap server.
pub struct SkymapClient {
    base: Url,
    http: reqwest::Client,
}

impl SkymapClient {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        Self::with_http(base, reqwest::Client::new())
    }

    pub fn with_http(base: &str, http: reqwest::Client) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: base.to_string(),
            reason,
        };
        let base = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) url".to_string()));
        }
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get_json(&["health"]).await
    }

    pub async fn chains(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(&["v1", "chains"]).await
    }

    pub async fn assets(&self) -> Result<Vec<String>, ClientError> {
        self.get_json(&["v1", "assets"]).await
    }

    /// Look up a chain by directory name or chain id.
    pub async fn chain(&self, name_or_id: &str) -> Result<ChainInfo, ClientError> {
        self.get_json(&["v1", "chain", name_or_id]).await
    }

    pub async fn asset(&self, display: &str) -> Result<Asset, ClientError> {
        self.get_json(&["v1", "asset", display]).await
    }

    pub async fn chain_assets(&self, name_or_id: &str) -> Result<Vec<Asset>, ClientError> {
        self.get_json(&["v1", "chain", name_or_id, "assets"]).await
    }

    pub async fn endpoints(
        &self,
        name_or_id: &str,
        kind: EndpointKind,
    ) -> Result<EndpointList, ClientError> {
        let path = ["v1", "chain", name_or_id, "endpoints", kind.as_str()];
        Ok(match kind {
            EndpointKind::Peers | EndpointKind::Seeds => {
                EndpointList::Peers(self.get_json(&path).await?)
            }
            EndpointKind::Rpc | EndpointKind::Grpc | EndpointKind::Rest => {
                EndpointList::Api(self.get_json(&path).await?)
            }
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // Checked in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        let url = self.url(segments);
        let resp = self.http.get(url.clone()).send().await?;

        match resp.status() {
            s if s.is_success() => Ok(resp.json().await?),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(url.path().to_string())),
            s => Err(ClientError::UnexpectedStatus {
                url: url.to_string(),
                status: s.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_base_urls() {
        assert!(matches!(
            SkymapClient::new("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
        assert!(matches!(
            SkymapClient::new("ftp://example.com"),
            Err(ClientError::InvalidUrl { .. })
        ));
        assert!(matches!(
            SkymapClient::new("mailto:ops@example.com"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_url_joins_and_encodes_segments() {
        let client = SkymapClient::new("http://localhost:8080/").unwrap();
        assert_eq!(
            client.url(&["v1", "chain", "cosmoshub", "endpoints", "rpc"]).as_str(),
            "http://localhost:8080/v1/chain/cosmoshub/endpoints/rpc"
        );
        assert_eq!(
            client.url(&["v1", "asset", "ibc/ABC DEF"]).as_str(),
            "http://localhost:8080/v1/asset/ibc%2FABC%20DEF"
        );

        let prefixed = SkymapClient::new("https://example.com/skymap").unwrap();
        assert_eq!(
            prefixed.url(&["health"]).as_str(),
            "https://example.com/skymap/health"
        );
    }

    #[test]
    fn test_chain_info_decodes_both_shapes() {
        let resolved: ChainInfo =
            serde_json::from_str(r#"{"chain_name": "osmosis", "chain_id": "osmosis-1"}"#).unwrap();
        assert_eq!(resolved.chain().unwrap().chain_id, "osmosis-1");

        let unresolved: ChainInfo = serde_json::from_str(r#"{"chain_name": "osmosis"}"#).unwrap();
        assert_eq!(
            unresolved,
            ChainInfo::Unresolved {
                chain_name: "osmosis".to_string()
            }
        );
        assert!(unresolved.chain().is_none());
    }
}
